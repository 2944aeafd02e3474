// ==============================================================================
// CLI for the QAPI to Protobuf Translator
// ==============================================================================
//
//   qapi2proto [OPTIONS] <QEMU_DIR> <OUTPUT_DIR>
//
// Reads `<QEMU_DIR>/qapi/*.json` and writes one `.proto` per document plus
// `descriptor.proto`, `service.proto`, and `events.proto` into `<OUTPUT_DIR>`.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use qapi2proto::Qapi2Proto;
use qapi2proto::compiler::{
    DEFAULT_DESCRIPTOR_IMPORT, DEFAULT_GO_PACKAGE, DEFAULT_PACKAGE, DEFAULT_SCHEMA_DIR,
    DEFAULT_SERVICE,
};

// ==============================================================================
// CLI Argument Definitions
// ==============================================================================

#[derive(Parser)]
#[command(
    name = "qapi2proto",
    version,
    about = "Translate QEMU QAPI schema files into protobuf definitions"
)]
struct Cli {
    /// QEMU source tree containing the schema directory.
    qemu_dir: PathBuf,
    /// Directory to write .proto files into (created if missing).
    #[arg(value_name = "OUTPUT_DIR")]
    out_dir: PathBuf,
    /// Schema subdirectory of QEMU_DIR.
    #[arg(long = "schema-dir", value_name = "NAME", default_value = DEFAULT_SCHEMA_DIR)]
    schema_dir: String,
    /// Protobuf package.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_PACKAGE)]
    package: String,
    /// Value of the go_package option.
    #[arg(long = "go-package", value_name = "VALUE", default_value = DEFAULT_GO_PACKAGE)]
    go_package: String,
    /// Import path of descriptor.proto.
    #[arg(long = "descriptor-import", value_name = "PATH", default_value = DEFAULT_DESCRIPTOR_IMPORT)]
    descriptor_import: String,
    /// RPC service name.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_SERVICE)]
    service: String,
    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ==============================================================================
// Entry Point
// ==============================================================================

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> miette::Result<()> {
    let mut builder = Qapi2Proto::new();
    builder
        .schema_dir(cli.schema_dir)
        .package(cli.package)
        .go_package(cli.go_package)
        .descriptor_import(cli.descriptor_import)
        .service(cli.service);

    let output = match builder.generate(&cli.qemu_dir, &cli.out_dir) {
        Ok(output) => output,
        Err(e) => {
            print_warnings(&builder.drain_warnings());
            return Err(e);
        }
    };
    print_warnings(&output.warnings);

    tracing::info!(
        files = output.files.len(),
        out_dir = %cli.out_dir.display(),
        "translation complete"
    );

    Ok(())
}

fn print_warnings(warnings: &[miette::Report]) {
    for warning in warnings {
        eprintln!("{warning:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library() {
        let cli = Cli::try_parse_from(["qapi2proto", "qemu", "out"]).unwrap();
        assert_eq!(cli.qemu_dir, PathBuf::from("qemu"));
        assert_eq!(cli.out_dir, PathBuf::from("out"));
        assert_eq!(cli.schema_dir, DEFAULT_SCHEMA_DIR);
        assert_eq!(cli.package, DEFAULT_PACKAGE);
        assert_eq!(cli.go_package, DEFAULT_GO_PACKAGE);
        assert_eq!(cli.descriptor_import, DEFAULT_DESCRIPTOR_IMPORT);
        assert_eq!(cli.service, DEFAULT_SERVICE);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn options_override_defaults() {
        let cli = Cli::try_parse_from([
            "qapi2proto",
            "--schema-dir",
            "schemas",
            "--package",
            "demo.v1",
            "--service",
            "Monitor",
            "qemu",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.schema_dir, "schemas");
        assert_eq!(cli.package, "demo.v1");
        assert_eq!(cli.service, "Monitor");
    }

    #[test]
    fn verbose_levels() {
        let cli = Cli::try_parse_from(["qapi2proto", "-vv", "qemu", "out"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn both_directories_are_required() {
        assert!(Cli::try_parse_from(["qapi2proto", "qemu"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
