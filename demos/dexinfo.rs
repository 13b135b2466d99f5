use dexview::dex::DexFile;
use std::env;
use std::error::Error;
use std::path::Path;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("usage: dexinfo <classes.dex> [--json]");
        return;
    }
    let json = args.iter().any(|a| a == "--json");

    match process_dex(&args[1], json) {
        Ok(_) => {}
        Err(e) => {
            println!("Aborted due to error: {}", e);
        }
    }
}

/* Parse the file, then print the summary and the class list */
fn process_dex(dex_file: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let dex = DexFile::from_file(Path::new(dex_file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dex.summary())?);
        return Ok(());
    }

    println!("{}", dex.summary());
    println!();
    for class in dex.class_defs() {
        let flags = class.access().class_keywords();
        let superclass = class.superclass_name.as_deref().unwrap_or("-");
        println!("{} {} extends {}", flags, class.class_name, superclass);
        for iface in &class.interfaces {
            println!("    implements {}", iface);
        }
    }
    for d in dex.diagnostics() {
        println!("unresolved: {}", d);
    }

    Ok(())
}
