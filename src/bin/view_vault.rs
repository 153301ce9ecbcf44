use vaultkit::cli::{commands, init_logging, report_error, Args, Tool};

fn main() {
    let args = Args::parse_for(Tool::View);
    init_logging(args.verbose);

    if let Err(e) = commands::view::execute(&args) {
        report_error(&e);
        std::process::exit(1);
    }
}
