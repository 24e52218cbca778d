use nse_tick_etl::oi::run_oi_pipeline;
use nse_tick_etl::{EtlError, PipelineConfig, SkipReason};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const MAPPING: &str = "symbol,token\nRELIANCE-EQ,2885\nTCS-EQ,11536\n";

    fn write(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn config_for(root: &Path) -> PipelineConfig {
        PipelineConfig {
            oi_data_dir: root.join("oi"),
            mapping_file: root.join("mapping.csv"),
            output_dir: root.join("Output"),
            ..PipelineConfig::default()
        }
    }

    fn seed(root: &Path) {
        write(&root.join("mapping.csv"), MAPPING);
        let day = root.join("oi").join("2024-11-29");
        write(
            &day.join("RELIANCE").join("2024-11-29T09%3A15%3A04.633.csv"),
            "symbol,openInterest,buildUp,ltp\n\
             RELIANCE29NOV241300CE,1200,Long Buildup,12.5\n\
             RELIANCE29NOV241300PE,800,Short Covering,9\n",
        );
        // Identifier that does not decompose: row kept with null option columns
        write(
            &day.join("TCS").join("2024-11-29T09%3A16%3A59.999.csv"),
            "symbol,openInterest,buildUp,ltp\nTCSFUT,50,,4100.25\n",
        );
        // Missing buildUp: the whole file is skipped
        write(
            &day.join("TCS").join("2024-11-29T09%3A17%3A00.000.csv"),
            "symbol,openInterest,ltp\nTCS29NOV244000CE,1,2\n",
        );
        // No mapping entry for this stock
        write(
            &day.join("UNKNOWN").join("2024-11-29T09%3A15%3A00.000.csv"),
            "symbol,openInterest,buildUp,ltp\nUNKNOWN29NOV24100CE,1,,1\n",
        );
        write(&day.join("RELIANCE").join("notes.txt"), "ignore me");
    }

    #[test]
    fn test_oi_pipeline_writes_combined_table() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let config = config_for(dir.path());

        let run = run_oi_pipeline(&config).unwrap();
        assert_eq!(run.records.len(), 3);
        assert_eq!(run.summary.rows_out, 3);
        assert_eq!(run.summary.files_processed, 2);

        let written = fs::read_to_string(config.oi_output_path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines,
            vec![
                "openInterest,buildUp,ltp,Stock Name,Expiry,StrikePrice,Type,Token,Time",
                "1200,Long Buildup,12.5,RELIANCE,29NOV24,1300,CE,2885,2024-11-29 09:15:00+05:30",
                "800,Short Covering,9,RELIANCE,29NOV24,1300,PE,2885,2024-11-29 09:15:00+05:30",
                "50,,4100.25,,,,,11536,2024-11-29 09:16:00+05:30",
            ]
        );
    }

    #[test]
    fn test_oi_pipeline_records_skips() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());

        let run = run_oi_pipeline(&config_for(dir.path())).unwrap();
        let summary = &run.summary;

        assert_eq!(summary.count_skips(|r| matches!(r, SkipReason::MissingColumns(_))), 1);
        assert_eq!(
            summary.count_skips(|r| *r == SkipReason::UnmappedSymbol("UNKNOWN".to_string())),
            1
        );
        assert_eq!(summary.count_skips(|r| *r == SkipReason::NotCsv), 1);
        assert_eq!(summary.problem_count(), 2);
    }

    #[test]
    fn test_oi_pipeline_symbol_filter() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let config = PipelineConfig {
            filter_symbols: Some(vec!["TCS".to_string()]),
            ..config_for(dir.path())
        };

        let run = run_oi_pipeline(&config).unwrap();
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.records[0].token.as_str(), "11536");
        assert_eq!(run.summary.count_skips(|r| *r == SkipReason::FilteredOut), 1);
    }

    #[test]
    fn test_oi_pipeline_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let config = config_for(dir.path());

        run_oi_pipeline(&config).unwrap();
        let first = fs::read(config.oi_output_path()).unwrap();
        run_oi_pipeline(&config).unwrap();
        let second = fs::read(config.oi_output_path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_oi_pipeline_keeps_rows_around_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("mapping.csv"), MAPPING);
        write(
            &dir.path().join("oi").join("2024-11-29").join("RELIANCE").join("2024-11-29T09%3A15%3A04.633.csv"),
            "symbol,openInterest,buildUp,ltp\n\
             RELIANCE29NOV241300CE,1200,Long Buildup,12.5\n\
             RELIANCE29NOV241400CE,-,,0\n",
        );
        let config = config_for(dir.path());

        let run = run_oi_pipeline(&config).unwrap();
        assert_eq!(run.summary.problem_count(), 0);

        let written = fs::read_to_string(config.oi_output_path()).unwrap();
        let lines: Vec<&str> = written.lines().skip(1).collect();
        assert_eq!(
            lines,
            vec![
                "1200,Long Buildup,12.5,RELIANCE,29NOV24,1300,CE,2885,2024-11-29 09:15:00+05:30",
                ",,0,RELIANCE,29NOV24,1400,CE,2885,2024-11-29 09:15:00+05:30",
            ]
        );
    }

    #[test]
    fn test_oi_pipeline_empty_input_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("mapping.csv"), MAPPING);
        fs::create_dir_all(dir.path().join("oi")).unwrap();
        let config = config_for(dir.path());

        let run = run_oi_pipeline(&config).unwrap();
        assert!(run.records.is_empty());
        let written = fs::read_to_string(config.oi_output_path()).unwrap();
        assert_eq!(written.trim_end(), "openInterest,buildUp,ltp,Stock Name,Expiry,StrikePrice,Type,Token,Time");
    }

    #[test]
    fn test_oi_pipeline_fatal_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());

        // No mapping file
        assert!(matches!(run_oi_pipeline(&config), Err(EtlError::Mapping(_))));

        // Mapping present, data directory absent
        write(&dir.path().join("mapping.csv"), MAPPING);
        assert!(matches!(run_oi_pipeline(&config), Err(EtlError::Io(_))));
    }
}
