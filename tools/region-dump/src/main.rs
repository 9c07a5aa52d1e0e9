// Inspect and build region-data files.
//
// Usage:
//   region-dump info <file> [--matrix m11 m12 m21 m22 dx dy]
//   region-dump mask <file> [-w <max_cols>]
//   region-dump make <output> (<mode> rect|ellipse <x> <y> <w> <h>)...

use gdiplus_region::{CombineMode, GraphicsPath, Matrix, RectF, Region};
use std::fs;
use std::process;

const MASK_COLUMNS: i32 = 72;
const MASK_ROWS: i32 = 48;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "info" => cmd_info(&args[2..]),
        "mask" => cmd_mask(&args[2..]),
        "make" => cmd_make(&args[2..]),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("region-dump: inspect and build GDI+ region data");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file> [--matrix m11 m12 m21 m22 dx dy]");
    eprintln!("      Print the region type, bounds and scan rectangles.");
    eprintln!();
    eprintln!("  mask <file> [-w <max_cols>]");
    eprintln!("      Draw the region as ASCII, one character per pixel.");
    eprintln!();
    eprintln!("  make <output> (<mode> rect|ellipse <x> <y> <w> <h>)...");
    eprintln!("      Start from the empty region and combine shapes into it.");
    eprintln!("      Modes: replace intersect union xor exclude complement.");
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{}", msg);
    process::exit(1);
}

fn parse_f32(s: &str) -> f32 {
    s.parse()
        .unwrap_or_else(|_| fail(format!("Invalid number: {}", s)))
}

fn load_region(path: &str) -> Region {
    let data = fs::read(path).unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path, e)));
    Region::from_data(&data).unwrap_or_else(|e| fail(format!("Failed to decode {}: {}", path, e)))
}

fn cmd_info(args: &[String]) {
    if args.is_empty() {
        fail("Usage: region-dump info <file> [--matrix m11 m12 m21 m22 dx dy]");
    }
    let region = load_region(&args[0]);

    let mut matrix = Matrix::identity();
    if args.len() >= 8 && args[1] == "--matrix" {
        let m: Vec<f32> = args[2..8].iter().map(|s| parse_f32(s)).collect();
        matrix = Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5]);
    }

    println!("type:   {:?}", region.region_type());
    if let Some(tree) = region.path_tree() {
        println!("leaves: {}  depth: {}", tree.leaf_count(), tree.depth());
    }
    match region.bounds() {
        Ok(b) => println!("bounds: {} {} {} {}", b.x, b.y, b.width, b.height),
        Err(e) => fail(format!("bounds: {}", e)),
    }
    println!("bytes:  {}", region.data_size());

    let scans = region
        .scans(&matrix)
        .unwrap_or_else(|e| fail(format!("scans: {}", e)));
    println!("scans:  {}", scans.len());
    for r in &scans {
        println!("  {} {} {} {}", r.x, r.y, r.width, r.height);
    }
}

fn cmd_mask(args: &[String]) {
    if args.is_empty() {
        fail("Usage: region-dump mask <file> [-w <max_cols>]");
    }
    let region = load_region(&args[0]);
    let mut max_cols = MASK_COLUMNS;
    if args.len() >= 3 && args[1] == "-w" {
        max_cols = args[2]
            .parse()
            .unwrap_or_else(|_| fail(format!("Invalid width: {}", args[2])));
    }

    if region.is_infinite() {
        println!("(infinite)");
        return;
    }
    let b = region
        .bounds()
        .unwrap_or_else(|e| fail(format!("bounds: {}", e)));
    if b.is_infinite() {
        println!("(unbounded, everything outside a finite hole)");
        return;
    }
    if b.is_empty() {
        println!("(empty)");
        return;
    }

    let x0 = b.x.floor() as i32;
    let y0 = b.y.floor() as i32;
    let cols = (b.right().ceil() as i32 - x0).min(max_cols.max(1));
    let rows = (b.bottom().ceil() as i32 - y0).min(MASK_ROWS);
    println!("origin {} {}, {}x{} shown", x0, y0, cols, rows);
    for y in y0..y0 + rows {
        let line: String = (x0..x0 + cols)
            .map(|x| {
                match region.is_visible_point(x as f32 + 0.5, y as f32 + 0.5) {
                    Ok(true) => '#',
                    Ok(false) => '.',
                    Err(_) => '?',
                }
            })
            .collect();
        println!("{}", line);
    }
}

fn parse_mode(s: &str) -> CombineMode {
    match s {
        "replace" => CombineMode::Replace,
        "intersect" => CombineMode::Intersect,
        "union" => CombineMode::Union,
        "xor" => CombineMode::Xor,
        "exclude" => CombineMode::Exclude,
        "complement" => CombineMode::Complement,
        _ => fail(format!("Unknown combine mode: {}", s)),
    }
}

fn cmd_make(args: &[String]) {
    if args.len() < 7 || (args.len() - 1) % 6 != 0 {
        fail("Usage: region-dump make <output> (<mode> rect|ellipse <x> <y> <w> <h>)...");
    }
    let output = &args[0];
    let mut region = Region::empty();

    for step in args[1..].chunks(6) {
        let mode = parse_mode(&step[0]);
        let rect = RectF::new(
            parse_f32(&step[2]),
            parse_f32(&step[3]),
            parse_f32(&step[4]),
            parse_f32(&step[5]),
        );
        let result = match step[1].as_str() {
            "rect" => region.combine_rect(rect, mode),
            "ellipse" => {
                let mut path = GraphicsPath::default();
                path.add_ellipse(rect);
                region.combine_path(&path, mode)
            }
            other => fail(format!("Unknown shape: {}", other)),
        };
        if let Err(e) = result {
            fail(format!("{} {} failed: {}", step[0], step[1], e));
        }
    }

    let data = region.to_data();
    fs::write(output, &data).unwrap_or_else(|e| fail(format!("Failed to write {}: {}", output, e)));
    println!("Saved: {} ({:?}, {} bytes)", output, region.region_type(), data.len());
}
