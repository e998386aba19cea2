use super::*;

#[test]
fn convert_mode_requires_output() {
    let cli = Cli::parse_from([
        "catl-convert",
        "--input",
        "in.jsonl",
    ]);
    assert!(!cli.is_inspect_mode());
    let err = run(&cli).unwrap_err();
    assert!(format!("{err:#}").contains("--output"));
}

#[test]
fn get_key_flag_selects_inspect_mode() {
    let cli = Cli::parse_from([
        "catl-convert",
        "--input",
        "catalogue.dat",
        "--get-key",
        "00",
        "--get-ledger",
        "1",
    ]);
    assert!(cli.is_inspect_mode());
}

#[test]
fn verify_and_test_defaults_true_and_no_flag_overrides_it() {
    let cli = Cli::parse_from(["catl-convert", "--input", "in.jsonl", "--output", "out.dat"]);
    assert!(cli.verify_and_test());

    let cli = Cli::parse_from([
        "catl-convert",
        "--input",
        "in.jsonl",
        "--output",
        "out.dat",
        "--no-verify-and-test",
    ]);
    assert!(!cli.verify_and_test());
}
