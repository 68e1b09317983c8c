use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use toml::Table;

const DEFAULT_MAX_INTERRUPTS: i64 = 1020;
const DEFAULT_PRIORITY: i64 = 0xA0;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=config.toml");
    println!("cargo::rustc-check-cfg=cfg(gic, values(\"v2\", \"v3\"))");

    let out_dir = env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    // Config parsing
    let config_str = fs::read_to_string("config.toml").unwrap_or_default();
    let root: Table = if !config_str.is_empty() {
        toml::from_str(&config_str).unwrap_or_else(|e| {
            println!("cargo:warning=Failed to parse config.toml: {}", e);
            Table::new()
        })
    } else {
        Table::new()
    };

    let mut protocol_set = false;
    if let Some(arch_table) = root.get("arch").and_then(|v| v.as_table()) {
        for (key, value) in arch_table {
            if let Some(choice) = value.as_str() {
                println!("cargo:rustc-cfg={}=\"{}\"", key, choice);
                protocol_set |= key == "gic";
            }
        }
    }
    if !protocol_set {
        println!("cargo:rustc-cfg=gic=\"v2\"");
    }

    let irqchip = root.get("irqchip").and_then(|v| v.as_table());
    let integer = |key: &str, default: i64| {
        irqchip
            .and_then(|t| t.get(key))
            .and_then(|v| v.as_integer())
            .unwrap_or(default)
    };

    let max_interrupts = integer("max_interrupts", DEFAULT_MAX_INTERRUPTS);
    if !(32..=1020).contains(&max_interrupts) {
        panic!(
            "irqchip.max_interrupts must be within 32..=1020, got {}",
            max_interrupts
        );
    }
    let priority = integer("default_priority", DEFAULT_PRIORITY);
    if !(0..=0xFF).contains(&priority) {
        panic!("irqchip.default_priority must fit in a byte, got {}", priority);
    }

    let mut generated = String::new();
    writeln!(
        generated,
        "/// Number of vector table slots, and the first id treated as spurious."
    )
    .unwrap();
    writeln!(generated, "pub const MAX_INTERRUPTS: usize = {};", max_interrupts).unwrap();
    writeln!(generated, "/// Priority programmed into every line by `Gic::init`.").unwrap();
    writeln!(generated, "pub const DEFAULT_PRIORITY: u8 = {:#04x};", priority).unwrap();

    fs::write(out_path.join("config.rs"), generated).unwrap();
}
