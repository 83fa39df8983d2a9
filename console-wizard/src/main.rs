use std::path::PathBuf;

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{}=", flag);
    args.iter()
        .find(|a| a.as_str() == flag || a.starts_with(&prefix))
        .and_then(|a| a.split_once('='))
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.trim().is_empty())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    let prefix = format!("{}=", flag);
    args.iter()
        .any(|a| a.as_str() == flag || a.starts_with(&prefix))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // --config <path> or --config=<path>; otherwise the per-user file is used when present.
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .or_else(|| flag_value(&args, "--config"))
        .map(PathBuf::from);

    if args.iter().any(|a| a == "--print-config") {
        console_wizard::run_print_config(config_path);
        return;
    }

    // Scripted wizard run against the loopback executor (or the configured
    // executor with --executor=http). Writes `wizard_smoke_<kind>_transcript.log`.
    // Usage: --wizard-smoke or --wizard-smoke=universal|csv|postgresql|mssql|ldap|ldap-group
    if has_flag(&args, "--wizard-smoke") {
        let use_http = args.iter().any(|a| a == "--executor=http");
        console_wizard::run_wizard_smoke(flag_value(&args, "--wizard-smoke"), use_http, config_path);
        return;
    }

    // Renders a single wizard frame for a connector kind and exits 0.
    // Usage: --tui-smoke or --tui-smoke=<kind>
    if has_flag(&args, "--tui-smoke") {
        console_wizard::run_tui_smoke(flag_value(&args, "--tui-smoke"), config_path);
        return;
    }

    eprintln!(
        "usage: console-wizard [--config <path>] (--wizard-smoke[=<kind>] [--executor=http] | --tui-smoke[=<kind>] | --print-config)"
    );
    std::process::exit(2);
}
