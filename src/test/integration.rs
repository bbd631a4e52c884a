/// Testing functionality which spans mods
#[cfg(test)]
mod tests {
    use crate::account_store::NewAccount;
    use crate::cli_io::{CliOptions, OutputMethod};
    use crate::config::{EngineConfig, RefundBalanceMode};
    use crate::ledger_engine::LedgerEngine;
    use crate::test::utils::{_get_test_input_file, _get_test_output_file};
    use csv::ReaderBuilder;
    use rust_decimal_macros::dec;

    fn validate_tst_file(file_path: &str, accounts_str: Vec<Vec<&str>>) {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .from_path(file_path)
            .unwrap();

        let mut records = rdr.records();
        for accnt in accounts_str.iter() {
            match records.next() {
                Some(record) => assert_eq!(record.unwrap(), *accnt),
                None => panic!("File is missing Records"),
            }
        }

        if records.next().is_some() {
            panic!("File has excess records")
        }
    }

    fn execute_on_tst_files(operations: &str, subdir: &str, config: &EngineConfig) -> String {
        let output = _get_test_output_file("accounts", subdir);
        let cli_input = CliOptions {
            accounts_file: _get_test_input_file("accounts.csv"),
            operations_file: _get_test_input_file(operations),
            config_file: None,
            output: OutputMethod::Csv(output.clone()),
        };
        let mut engine = LedgerEngine::new(config);
        let res = engine.streaming_execute(&cli_input);
        assert!(res.is_ok(), "Error free is the way to be");
        output
    }

    /// Testing functionality in ledger_engine & file io
    #[test]
    fn tst_streaming_execute() {
        let config = EngineConfig::load(_get_test_input_file("sequential.yaml")).unwrap();
        let config = EngineConfig {
            code_prefix: "TRF".to_string(),
            ..config
        };
        let output = execute_on_tst_files("operations.csv", "streaming_execute", &config);
        let expected = vec![
            vec!["1", "1", "", "true", "35.0000", "active"],
            vec!["2", "1", "1", "false", "21.0000", "blocked"],
            vec!["3", "1", "1", "false", "128.0000", "active"],
            vec!["4", "2", "", "true", "13.0000", "active"],
        ];
        validate_tst_file(&output, expected);
    }

    #[test]
    fn tst_deposit_refund_modes() {
        let mut config = EngineConfig::from_yaml_str("code_generator: sequential").unwrap();
        let output = execute_on_tst_files("deposit_refund.csv", "single_apply", &config);
        let mut rdr = ReaderBuilder::new().from_path(&output).unwrap();
        let first = rdr.records().next().unwrap().unwrap();
        assert_eq!(&first[4], "45.0000", "Deposit then refund by code nets to zero");

        config.refund_mode = RefundBalanceMode::DoubleApply;
        let output = execute_on_tst_files("deposit_refund.csv", "double_apply", &config);
        let mut rdr = ReaderBuilder::new().from_path(&output).unwrap();
        let first = rdr.records().next().unwrap().unwrap();
        assert_eq!(&first[4], "43.0000");
    }

    /// Main A at 45.0 takes a 2.0 deposit, then the deposit is refunded by code
    #[test]
    fn tst_scenario_deposit_refund_by_code() {
        let mut engine = LedgerEngine::new(&EngineConfig::default());
        let a = engine
            .accounts
            .create(NewAccount::main(1).with_balance(dec!(45.0)))
            .unwrap()
            .id;

        let deposit = engine.create_transfer(a, None, dec!(2.0)).unwrap();
        assert_eq!(engine.accounts.find(a).unwrap().balance, dec!(47.0));
        let code = deposit.code.expect("Deposit should carry a code");
        assert!(!code.as_str().is_empty());

        assert!(engine.refund(Some(code.as_str()), None).is_ok());
        assert_eq!(engine.accounts.find(a).unwrap().balance, dec!(45.0));
    }

    /// Main M at 45.0 sends 10.0 to its filial F1 at 21.0
    #[test]
    fn tst_scenario_main_to_filial() {
        let mut engine = LedgerEngine::new(&EngineConfig::default());
        let m = engine
            .accounts
            .create(NewAccount::main(1).with_balance(dec!(45.0)))
            .unwrap()
            .id;
        let f1 = engine
            .accounts
            .create(NewAccount::filial(1, m).with_balance(dec!(21.0)))
            .unwrap()
            .id;

        let txn = engine.create_transfer(f1, Some(m), dec!(10.0)).unwrap();
        assert_eq!(txn.code, None);
        assert_eq!(engine.accounts.find(m).unwrap().balance, dec!(35.0));
        assert_eq!(engine.accounts.find(f1).unwrap().balance, dec!(31.0));
        assert!(engine
            .accounts
            .accounts()
            .iter()
            .all(|acnt| acnt.hierarchy_consistent()));
    }
}
