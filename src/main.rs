use std::io::{self, BufRead, Write};

use minidb::btree::node;
use minidb::database::Table;
use minidb::record::ROW_SIZE;
use minidb::statement::{self, MetaCommand, Statement};

fn main() {
    let filename = match std::env::args().nth(1) {
        Some(filename) => filename,
        None => {
            println!("Must supply a database filename.");
            std::process::exit(1);
        }
    };

    let mut table = match Table::open(&filename) {
        Ok(table) => table,
        Err(err) => {
            println!("Error opening database: {err}");
            std::process::exit(1);
        }
    };

    let mut stdin = io::stdin().lock();
    let mut line = String::new();

    loop {
        print!("db > ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                println!("Error reading input: {err}");
                continue;
            }
        }
        let input = line.trim_end_matches(['\n', '\r']);

        if input.starts_with('.') {
            match MetaCommand::parse(input) {
                Some(MetaCommand::Exit) => {
                    if let Err(err) = table.close() {
                        println!("Error closing database: {err}");
                    }
                    println!("Bye!");
                    std::process::exit(0);
                }
                Some(MetaCommand::Btree) => {
                    println!("Tree:");
                    match table.render_tree() {
                        Ok(tree) => print!("{tree}"),
                        Err(err) => println!("Error printing tree: {err}"),
                    }
                }
                Some(MetaCommand::Constants) => {
                    println!("Constants:");
                    print_constants();
                }
                None => println!("Unrecognized command '{input}'"),
            }
            continue;
        }

        match statement::prepare(input) {
            Ok(Statement::Insert { row }) => match table.insert(&row) {
                Ok(()) => println!("Executed."),
                Err(err) => println!("Error: {err}"),
            },
            Ok(Statement::Select) => match table.select() {
                Ok(rows) => {
                    for row in &rows {
                        println!("{row}");
                    }
                    println!("Executed.");
                }
                Err(err) => println!("Error: {err}"),
            },
            Err(err) => println!("{err}"),
        }
    }

    // Input exhausted without `.exit`; still leave the file consistent.
    if let Err(err) = table.close() {
        println!("Error closing database: {err}");
    }
}

fn print_constants() {
    println!("ROW_SIZE: {ROW_SIZE}");
    println!("COMMON_NODE_HEADER_SIZE: {}", node::COMMON_NODE_HEADER_SIZE);
    println!("LEAF_NODE_HEADER_SIZE: {}", node::LEAF_NODE_HEADER_SIZE);
    println!("LEAF_NODE_CELL_SIZE: {}", node::LEAF_NODE_CELL_SIZE);
    println!(
        "LEAF_NODE_SPACE_FOR_CELLS: {}",
        node::LEAF_NODE_SPACE_FOR_CELLS
    );
    println!("LEAF_NODE_MAX_CELLS: {}", node::LEAF_NODE_MAX_CELLS);
}
