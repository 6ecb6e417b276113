//! Flag parsing through a wrapping `clap` command.

use std::num::NonZeroUsize;

use clap::Parser;
use mender_config::{ConfigArgs, ConfigError, LogFormat};
use rstest::rstest;

#[derive(Parser, Debug)]
struct Harness {
    #[command(flatten)]
    config: ConfigArgs,
}

fn parse(args: &[&str]) -> Harness {
    Harness::try_parse_from(std::iter::once("mender").chain(args.iter().copied()))
        .expect("flags parse")
}

#[test]
fn flags_override_defaults() {
    let config = parse(&[
        "--log-filter",
        "mender_syntax=debug",
        "--log-format",
        "compact",
        "--workers",
        "3",
    ])
    .config
    .resolve()
    .expect("valid config");

    assert_eq!(config.log_filter(), "mender_syntax=debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.workers(), NonZeroUsize::new(3).expect("non-zero"));
}

#[rstest]
#[case(&["--log-filter", "  "], ConfigError::EmptyLogFilter)]
#[case(&["--log-format", "xml"], ConfigError::LogFormat { value: "xml".to_owned() })]
#[case(&["--workers", "0"], ConfigError::Workers { value: "0".to_owned() })]
#[case(&["--workers", "many"], ConfigError::Workers { value: "many".to_owned() })]
fn unusable_values_are_rejected(#[case] args: &[&str], #[case] expected: ConfigError) {
    let err = parse(args).config.resolve().expect_err("invalid config");
    assert_eq!(err, expected);
}

#[test]
fn log_format_errors_list_the_choices() {
    let err = parse(&["--log-format", "xml"])
        .config
        .resolve()
        .expect_err("invalid format");
    assert_eq!(
        err.to_string(),
        "unknown log format 'xml' (expected 'json' or 'compact')"
    );
}
