use std::io::{self, BufRead, Write};

use skink::EvaluationContext;

fn main() -> io::Result<()> {
    let mut context = EvaluationContext::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "in> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            println!("  bye bye!");
            return Ok(());
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") {
            println!("  bye bye!");
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        match context.evaluate_str(line) {
            Ok(value) => println!("  out> {}", value),
            Err(error) => println!("  {}", error),
        }
        println!();
    }
}
