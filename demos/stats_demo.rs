use clap::Parser;
use dblhash::Table;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "items", default_value_t = 100_000)]
    items: u64,

    #[arg(long = "initial-size", default_value_t = 16)]
    initial_size: usize,
}

fn main() {
    let args = Args::parse();

    let mut table: Table<u64> = Table::with_size(args.initial_size);
    println!(
        "Created table: size {} (requested {})",
        table.size(),
        args.initial_size
    );

    for value in 0..args.items {
        table.insert(value);
    }
    println!("After {} inserts:    {}", args.items, table.stats());

    // Delete/insert churn builds tombstones; the table reclaims them on
    // insert and compacts them when the empty-slot margin runs out.
    for value in 0..args.items / 2 {
        table.remove(&value);
    }
    println!("After removing half: {}", table.stats());

    for value in 0..args.items / 2 {
        table.insert(value);
    }
    println!("After reinserting:   {}", table.stats());

    let sorted = table.dump_sorted(|a, b| a.cmp(b));
    println!(
        "Dump: {} items, first={:?}, last={:?}",
        sorted.len(),
        sorted.first(),
        sorted.last()
    );
}
