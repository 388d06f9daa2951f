//! esscope: Report the bindings and free variables of ECMAScript files.
//!
//! Usage:
//!   esscope [options] <file>...

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;
use esscope_ast::Node;
use esscope_core::arena::AstArena;
use esscope_diagnostics::{messages, Diagnostic, DiagnosticCategory};
use esscope_parser::Parser;
use esscope_traverse::{traverse, ScopeKind, ScopeRef, Traversal, TraverseError, TraverseOptions};
use log::{info, LevelFilter};

#[derive(ClapParser, Debug)]
#[command(name = "esscope", version, about = "Resolve identifiers of ECMAScript files to their declarations")]
struct Cli {
    /// Source files to analyze.
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// JSON file with traversal options.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not hoist `var` and function declarations.
    #[arg(long = "no-hoist")]
    no_hoist: bool,

    /// Print every scope with its bindings.
    #[arg(long)]
    bindings: bool,

    /// Report free variables (the default report).
    #[arg(long)]
    unresolved: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    process::exit(run(&cli));
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, overrides the -v level.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> i32 {
    let mut options = match &cli.config {
        Some(path) => match TraverseOptions::from_file(path) {
            Ok(options) => options,
            Err(err) => {
                print_error(&err.to_string());
                return 1;
            }
        },
        None => TraverseOptions::default(),
    };
    if cli.no_hoist {
        options.hoist_declarations = false;
    }
    info!("options: {:?}", options);

    let use_color = std::io::stderr().is_terminal();
    let show_unresolved = cli.unresolved || !cli.bindings;
    let mut error_count = 0;

    for path in &cli.files {
        let file_name = path.display().to_string();
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                print_error(&format!("cannot read `{}`: {}", file_name, err));
                error_count += 1;
                continue;
            }
        };

        let arena = AstArena::new();
        let mut parser = Parser::new(&arena, &file_name, &source);
        let program = parser.parse_program();
        let diagnostics = parser.take_diagnostics();
        if diagnostics.has_errors() {
            for diag in diagnostics.diagnostics() {
                print_diagnostic(diag, use_color);
            }
            error_count += diagnostics.error_count();
            continue;
        }

        let traversal = match traverse(&options, program, |_, _| {}) {
            Ok(traversal) => traversal,
            Err(TraverseError::UnsupportedNodeType { kind, line }) => {
                let diag = Diagnostic::with_location(
                    file_name.clone(),
                    line,
                    &messages::_0_IS_NOT_SUPPORTED_BY_SCOPE_RESOLUTION,
                    &[kind],
                );
                print_diagnostic(&diag, use_color);
                error_count += 1;
                continue;
            }
            Err(err) => {
                print_error(&format!("{}: {}", file_name, err));
                error_count += 1;
                continue;
            }
        };
        info!(
            "{}: {} scope(s), {} unresolved reference(s)",
            file_name,
            traversal.scope_manager.scope_count(),
            traversal.unresolved_references().len()
        );

        if cli.bindings {
            print_bindings(&file_name, &traversal, use_color);
        }
        if show_unresolved {
            print_unresolved(&file_name, &traversal, use_color);
        }
    }

    if error_count > 0 {
        let plural = if error_count == 1 { "" } else { "s" };
        if use_color {
            eprintln!("\n{}Found {} error{}.{}", RED, error_count, plural, RESET);
        } else {
            eprintln!("\nFound {} error{}.", error_count, plural);
        }
        return 1;
    }
    0
}

fn print_bindings(file_name: &str, traversal: &Traversal<'_>, use_color: bool) {
    for scope in traversal.scope_manager.scopes() {
        let header = scope_header(scope);
        if use_color {
            println!("{}{}{}: {}{}{}", CYAN, file_name, RESET, BOLD, header, RESET);
        } else {
            println!("{}: {}", file_name, header);
        }
        for (name, node) in scope.bindings() {
            let line = node.line().unwrap_or(1);
            if use_color {
                println!("  {} {}(line {}){}", name, GRAY, line, RESET);
            } else {
                println!("  {} (line {})", name, line);
            }
        }
    }
}

fn scope_header(scope: ScopeRef<'_, '_>) -> String {
    match scope.kind() {
        ScopeKind::Global => format!("global scope {}", scope.id()),
        ScopeKind::Function => {
            let owner = scope.owner();
            let name = owner.and_then(function_name).unwrap_or("<anonymous>");
            let line = owner.and_then(Node::line).unwrap_or(1);
            format!("function scope {} `{}` (line {})", scope.id(), name, line)
        }
    }
}

fn function_name<'a>(node: &'a Node<'a>) -> Option<&'a str> {
    node.as_function()?.id.get()?.identifier_name()
}

fn print_unresolved(file_name: &str, traversal: &Traversal<'_>, use_color: bool) {
    let mut report = Vec::new();
    for (name, node) in traversal.unresolved_references() {
        report.push(Diagnostic::with_location(
            file_name.to_string(),
            node.line().unwrap_or(1),
            &messages::CANNOT_FIND_NAME_0,
            &[*name],
        ));
    }
    for node in traversal.scope_manager.implicit_globals() {
        let name = node.identifier_name().unwrap_or_default();
        report.push(Diagnostic::with_location(
            file_name.to_string(),
            node.line().unwrap_or(1),
            &messages::_0_IS_AN_IMPLICIT_GLOBAL,
            &[name],
        ));
    }
    report.sort_by_key(|diag| diag.line);
    for diag in &report {
        print_diagnostic(diag, use_color);
    }
}

fn print_diagnostic(diag: &Diagnostic, use_color: bool) {
    if use_color {
        let color = match diag.category {
            DiagnosticCategory::Error => RED,
            DiagnosticCategory::Warning => YELLOW,
            DiagnosticCategory::Message => GRAY,
        };
        if let Some(ref file) = diag.file {
            eprint!("{}{}{}", CYAN, file, RESET);
            if let Some(line) = diag.line {
                eprint!("({})", line);
            }
            eprint!(": ");
        }
        eprintln!(
            "{}{}{}{} {}ES{}{}: {}",
            BOLD, color, diag.category, RESET, CYAN, diag.code, RESET, diag.message_text
        );
    } else {
        eprintln!("{}", diag);
    }
}

fn print_error(msg: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{}{}error{}: {}", BOLD, RED, RESET, msg);
    } else {
        eprintln!("error: {}", msg);
    }
}
