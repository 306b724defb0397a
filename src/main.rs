use iso8211::{DdfFieldDefn, DdfModule, DdfSubfieldDefn, Result};
use std::env;

/// Fallback definition compiler for plain dumping: every field is treated
/// as a single variable-width text subfield, so records can be walked and
/// printed without knowing the transfer's format-control conventions.
fn raw_text_compiler(tag: &str, _field_length: usize, _data: &[u8]) -> Result<DdfFieldDefn> {
    let subfield = DdfSubfieldDefn::new("DATA", "A")?;
    Ok(DdfFieldDefn::new(tag, tag, false, vec![subfield]))
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-8211-file> [--max-records <N>]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let mut max_records = usize::MAX;
    if let Some(idx) = args.iter().position(|arg| arg == "--max-records") {
        match args.get(idx + 1).and_then(|s| s.parse().ok()) {
            Some(n) => max_records = n,
            None => {
                eprintln!("ERROR: --max-records flag requires a number.");
                std::process::exit(1);
            }
        }
    }

    println!("Reading ISO 8211 file: {}", path);
    println!("{}", "=".repeat(60));

    let mut module = match DdfModule::open(path, &raw_text_compiler) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("\nERROR: Failed to open ISO 8211 file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!("\nData Descriptive Record:");
    println!("  Record length: {}", module.leader().record_length);
    println!(
        "  Interchange level: {}",
        module.leader().interchange_level as char
    );
    println!("  Fields defined: {}", module.field_defn_count());
    for i in 0..module.field_defn_count() {
        if let Some(defn) = module.field_defn(i) {
            println!("    {}", defn.tag());
        }
    }

    let mut count = 0;
    while count < max_records {
        match module.read_record() {
            Ok(Some(record)) => {
                count += 1;
                println!("\nRecord {} ({} fields):", count, record.field_count());
                for i in 0..record.field_count() {
                    if let Some(field) = record.field(i) {
                        let preview: String = field
                            .data()
                            .iter()
                            .map(|&b| {
                                if b.is_ascii_graphic() || b == b' ' {
                                    b as char
                                } else {
                                    '.'
                                }
                            })
                            .take(60)
                            .collect();
                        println!(
                            "  {:<6} {:>5} bytes  |{}|",
                            field.defn().tag(),
                            field.data().len(),
                            preview
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("\nERROR: Failed to read record {}", count + 1);
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("Read {} data records.", count);
}
