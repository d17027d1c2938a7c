use std::io::{self, BufRead, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print!("> ");
    io::stdout().flush()?;
    while let Some(line) = lines.next() {
        let line = line?;
        if !line.trim().is_empty() {
            for flat in macrodice::flatten_dice_macro(&line, &[]) {
                println!("{}", macrodice::roll(&flat).render());
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
