use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Reflected CRC-32 polynomial (ISO 3309 / ITU-T V.42, as used by PNG).
const POLYNOMIAL: u32 = 0xEDB8_8320;

fn crc_table_entry(index: u32) -> u32 {
    let mut c = index;
    for _ in 0..8 {
        c = if c & 1 != 0 {
            POLYNOMIAL ^ (c >> 1)
        } else {
            c >> 1
        };
    }
    c
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("crc_table.rs");
    let mut file = File::create(&dest_path).unwrap();

    // Generate CRC_TABLE (256 entries, one per byte value)
    writeln!(file, "/// Lookup table for byte-at-a-time CRC-32").unwrap();
    writeln!(file, "/// Index: (crc ^ byte) & 0xff, Value: partial remainder").unwrap();
    writeln!(file, "pub static CRC_TABLE: [u32; 256] = [").unwrap();
    for i in 0..256u32 {
        if i > 0 && i % 8 == 0 {
            writeln!(file).unwrap();
        }
        write!(file, "    0x{:08X},", crc_table_entry(i)).unwrap();
    }
    writeln!(file, "\n];").unwrap();

    // Rerun if build.rs changes
    println!("cargo::rerun-if-changed=build.rs");
}
