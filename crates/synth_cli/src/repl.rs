//! Interactive session over one dictionary.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use synth_ast::Value;
use synth_engine::Dictionary;

pub struct Repl {
    dict: Dictionary,
}

impl Repl {
    pub fn new(dict: Dictionary) -> Repl {
        Repl { dict }
    }

    pub fn run(&mut self) -> rustyline::Result<()> {
        println!(
            "Expression synthesis over base '{}' ({} entries seeded).",
            self.dict.base(),
            self.dict.len()
        );
        println!("Commands: prove <n> [depth], trace <n>, eval <expr>, base <digits>, export <file>, stats, help, quit");

        let mut rl = DefaultEditor::new()?;
        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line)?;
                    if line == "quit" || line == "exit" {
                        break;
                    }
                    self.handle_command(line);
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("error: {err}");
                    break;
                }
            }
        }
        Ok(())
    }

    fn handle_command(&mut self, line: &str) {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        match command {
            "prove" => self.cmd_prove(rest),
            "trace" => self.cmd_trace(rest),
            "eval" => self.cmd_eval(rest),
            "base" => self.cmd_base(rest),
            "export" => self.cmd_export(rest),
            "stats" => {
                println!(
                    "base '{}', {} entries",
                    self.dict.base(),
                    self.dict.len()
                );
            }
            "help" => {
                println!("prove <n> [depth]  derive an expression for n");
                println!("trace <n>          derive and show the step-by-step evaluation");
                println!("eval <expr>        evaluate an expression string exactly");
                println!("base <digits>      start over with a new base digit string");
                println!("export <file>      write dictionary contents as JSON");
                println!("stats              dictionary size");
                println!("quit               leave");
            }
            _ => println!("unknown command '{command}' (try 'help')"),
        }
    }

    fn cmd_prove(&mut self, args: &str) {
        let mut parts = args.split_whitespace();
        let target = match parts.next() {
            Some(t) => t,
            None => {
                println!("usage: prove <n> [depth]");
                return;
            }
        };
        let depth = match parts.next().map(str::parse::<u64>) {
            Some(Ok(d)) => Some(d),
            Some(Err(_)) => {
                println!("depth must be a non-negative integer");
                return;
            }
            None => None,
        };
        let mut report = |partial: &str| println!("  ... {partial}");
        match self.dict.prove_with(target, depth, Some(&mut report)) {
            Ok(proof) => println!("{target} = {proof}"),
            Err(e) => println!("error: {e}"),
        }
    }

    fn cmd_trace(&mut self, args: &str) {
        let target = match Value::parse(args) {
            Ok(v) => v,
            Err(e) => {
                println!("error: {e}");
                return;
            }
        };
        match self.dict.prove_expr(&target, None, None) {
            Ok(node) => match node.trace() {
                Ok(trace) => {
                    if trace.text.is_empty() {
                        println!("{} is a literal", node.render());
                    } else {
                        print!("{}", trace.text);
                    }
                }
                Err(e) => println!("error: {e}"),
            },
            Err(e) => println!("error: {e}"),
        }
    }

    fn cmd_eval(&mut self, args: &str) {
        match synth_parser::evaluate_str(args) {
            Ok(value) => println!("{value}"),
            Err(e) => println!("error: {e}"),
        }
    }

    fn cmd_base(&mut self, args: &str) {
        match Dictionary::build(args) {
            Ok(dict) => {
                self.dict = dict;
                println!(
                    "rebuilt over base '{}' ({} entries)",
                    self.dict.base(),
                    self.dict.len()
                );
            }
            Err(e) => println!("error: {e}"),
        }
    }

    fn cmd_export(&mut self, args: &str) {
        if args.is_empty() {
            println!("usage: export <file>");
            return;
        }
        let pairs = self.dict.export_pairs();
        match serde_json::to_string_pretty(&pairs) {
            Ok(json) => match std::fs::write(args, json) {
                Ok(()) => println!("exported {} entries to {args}", pairs.len()),
                Err(e) => println!("error: cannot write {args}: {e}"),
            },
            Err(e) => println!("error: {e}"),
        }
    }
}
