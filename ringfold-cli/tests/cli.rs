use std::io::Write;

use assert_cmd::Command;

fn ringfold() -> Command {
    Command::cargo_bin("ringfold").unwrap()
}

#[test]
fn test_basic_partition_function() {
    let output = ringfold()
        .args(["-q", "-s", "GGGGAAAACCCC"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("N = 12"));
    assert!(stdout.contains("Z = "));
}

#[test]
fn test_two_strand_input() {
    let output = ringfold()
        .args(["-q", "-s", "GGGGCC", "GGCCCC"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("N = 12"));
}

#[test]
fn test_circle_flag() {
    let output = ringfold()
        .args(["-q", "-c", "-s", "GGGGAAAACCCC"])
        .output()
        .unwrap();
    assert!(output.status.success());
}

#[test]
fn test_circle_with_multiple_strands_fails() {
    ringfold()
        .args(["-q", "-c", "-s", "GGGG", "CCCC"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_sequence_fails() {
    ringfold().args(["-q", "-s", "GGXZ!"]).assert().failure();
}

#[test]
fn test_bpp_output() {
    let output = ringfold()
        .args(["-q", "--bpp", "-s", "GGGGAAAACCCC"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("base pair probabilities"));
}

#[test]
fn test_calc_deriv_reports_all_families() {
    let output = ringfold()
        .args(["-q", "--calc-deriv", "-s", "GGGGAAAACCCC"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in [
        "l",
        "l_BP",
        "C_init",
        "Kd_CG",
        "Kd_AU",
        "Kd_GU",
        "Kd_matchlowercase",
        "C_eff_stacked_pair",
        "K_coax",
        "l_coax",
    ] {
        assert!(
            stdout.contains(&format!("dlogZ/dlog{name} = ")),
            "missing derivative for {name}"
        );
    }
}

#[test]
fn test_unknown_deriv_param_is_skipped_not_fatal() {
    let output = ringfold()
        .args(["-q", "--deriv-params", "bogus", "l", "-s", "GGGGAAAACCCC"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("bogus"));
    assert!(stdout.contains("dlogZ/dlogl = "));
}

#[test]
fn test_verbose_dumps_matrices() {
    let output = ringfold()
        .args(["-q", "-v", "-s", "GGGGAAAACCCC"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("----- Z_linear -----"));
    assert!(stdout.contains("----- Z_BP -----"));
    assert!(stdout.contains("==>"));
}

#[test]
fn test_params_file_overrides_defaults() {
    let mut params_file = tempfile::NamedTempFile::new().unwrap();
    // A lone-hairpin sequence with l = 1, l_BP = 1, C_init = 1 and the
    // default Kd_CG of 1e-3 gives Z = 1 + 1/Kd = 1001 exactly.
    write!(
        params_file,
        r#"{{"c_init": 1.0, "l": 1.0, "l_bp": 1.0, "min_loop_length": 3}}"#
    )
    .unwrap();

    let output = ringfold()
        .args(["-q", "-s", "CAAAG"])
        .args(["--params", params_file.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Z = 1.001e3"), "stdout was: {stdout}");
}

#[test]
fn test_no_coax_changes_nothing_without_stackable_helices() {
    let with_coax = ringfold()
        .args(["-q", "-s", "CAAAG"])
        .output()
        .unwrap();
    let without_coax = ringfold()
        .args(["-q", "--no-coax", "-s", "CAAAG"])
        .output()
        .unwrap();
    assert_eq!(with_coax.stdout, without_coax.stdout);
}
