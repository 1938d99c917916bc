use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rpn_calc::Builtin;

/// Evaluate an arithmetic expression.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The expression, e.g. "sin(pi / 6) * (2 + 3E+1)".
    #[arg(required_unless_present = "list_functions")]
    expression: Option<String>,

    /// Print the token list and the RPN sequence.
    #[arg(long)]
    tokens: bool,

    /// Print the execution time.
    #[arg(long)]
    time: bool,

    /// Also print the IEEE-754 bit pattern of the result.
    #[arg(long)]
    bits: bool,

    /// List the supported functions and exit.
    #[arg(long)]
    list_functions: bool,

    /// Raise the log level (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(input: &str, show_tokens: bool) -> Result<f64, rpn_calc::Error> {
    if !show_tokens {
        return rpn_calc::eval_str(input);
    }

    let tokens = rpn_calc::tokenize(input)?;
    println!("{}", tokens);

    let rpn = rpn_calc::to_postfix(&tokens)?;
    println!("{}", rpn);

    Ok(rpn_calc::evaluate(&rpn)?)
}

/// Points at the offending character of a lexical error.
fn error_marker(input: &str, err: &rpn_calc::Error) -> Option<String> {
    let rpn_calc::Error::Tokenize(e) = err else {
        return None;
    };
    let column = input.get(..e.pos())?.chars().count();
    Some(format!("  {}\n  {}^", input, " ".repeat(column)))
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<rpn_calc::Error>().map_or(1, |e| e.status_code() as u8)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.list_functions {
        for builtin in Builtin::ALL {
            println!("{}", builtin);
        }
        return ExitCode::SUCCESS;
    }

    let Some(input) = args.expression.as_deref() else {
        return ExitCode::from(2);
    };

    let start = Instant::now();
    let outcome = run(input, args.tokens);
    let elapsed = start.elapsed();

    let code = match outcome {
        Ok(result) => {
            println!("{}", result);
            if args.bits {
                println!("bits: {}", hex::encode(result.to_be_bytes()));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let marker = error_marker(input, &e);
            let e = anyhow::Error::new(e).context(format!("cannot evaluate '{}'", input));
            eprintln!("Error: {:#}", e);
            if let Some(marker) = marker {
                eprintln!("{}", marker);
            }
            ExitCode::from(exit_code(&e))
        }
    };

    if args.time {
        println!("Execution Time: {:.8} seconds", elapsed.as_secs_f64());
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(input: &str) -> anyhow::Error {
        anyhow::Error::new(run(input, false).unwrap_err()).context("cannot evaluate")
    }

    #[test]
    fn test_args_require_one_expression() {
        let err = Args::try_parse_from(["rpn-calc"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = Args::try_parse_from(["rpn-calc", "1 + 2", "3"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let args = Args::try_parse_from(["rpn-calc", "--bits", "-vv", "1 + 2"]).unwrap();
        assert_eq!(args.expression.as_deref(), Some("1 + 2"));
        assert!(args.bits);
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["rpn-calc", "--list-functions"]).unwrap();
        assert!(args.list_functions);
        assert_eq!(args.expression, None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&failure("1a")), 3);
        assert_eq!(exit_code(&failure("(1 + 2")), 4);
        assert_eq!(exit_code(&failure("foo(1)")), 4);
        assert_eq!(exit_code(&failure("1 / 0")), 5);
        assert_eq!(exit_code(&failure("log(-1)")), 5);
        assert_eq!(exit_code(&anyhow::anyhow!("unrelated")), 1);
    }

    #[test]
    fn test_run_matches_staged_pipeline() {
        assert_eq!(run("(3 + 4) * 2", false).unwrap(), 14.0);
        assert_eq!(run("(3 + 4) * 2", true).unwrap(), 14.0);
        assert_eq!(run("1 / 0", true), run("1 / 0", false));
    }

    #[test]
    fn test_error_marker() {
        let err = run("2 * 3x", false).unwrap_err();
        assert_eq!(error_marker("2 * 3x", &err).unwrap(), "  2 * 3x\n      ^");

        let err = run("é + 1", false).unwrap_err();
        assert_eq!(error_marker("é + 1", &err).unwrap(), "  é + 1\n  ^");

        let err = run("1 / 0", false).unwrap_err();
        assert_eq!(error_marker("1 / 0", &err), None);
    }
}
