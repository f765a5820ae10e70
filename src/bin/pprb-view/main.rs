//! Interactive viewer for the persistent tree. Reads lowercase
//! commands from standard input, `inc k`, `rem k`, `suc k v` and
//! `imp [v]`; a line holding `0` quits. After every mutation the
//! affected version is reported, and `imp` renders the tree sideways,
//! right subtree above the root, left subtree below.

use std::io::{self, BufRead};

use pprb::{
    err_at,
    rbt::{Color, Index, NodeId},
    Result,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = repl() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn repl() -> Result<()> {
    let mut index = Index::new("pprb-view");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = err_at!(IOError, line)?;
        if line.trim() == "0" {
            break;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            ["inc", key] => match parse_i32(key) {
                Some(key) => match index.insert(key) {
                    Ok(ver) => println!("Inserted {} on version {}", key, ver),
                    Err(err) => eprintln!("Error: {}", err),
                },
                None => eprintln!("Error: bad integer {}", key),
            },
            ["rem", key] => match parse_i32(key) {
                Some(key) => match index.remove(key) {
                    Ok(Some(ver)) => println!("Removed {} on version {}", key, ver),
                    Ok(None) => println!("{} is not present", key),
                    Err(err) => eprintln!("Error: {}", err),
                },
                None => eprintln!("Error: bad integer {}", key),
            },
            ["suc", key, ver] => match (parse_i32(key), ver.parse::<u64>().ok()) {
                (Some(key), Some(ver)) => match index.successor(key, ver) {
                    i32::MAX => println!("Successor: Infinity"),
                    succ => println!("Successor: {}", succ),
                },
                _ => eprintln!("Error: suc expects a key and a version"),
            },
            ["imp"] => print_tree(&index, index.current_version()),
            ["imp", ver] => match ver.parse::<u64>().ok() {
                Some(ver) => print_tree(&index, u64::min(ver, index.current_version())),
                None => eprintln!("Error: bad version {}", ver),
            },
            ["inc", ..] | ["rem", ..] => eprintln!("Error: {} expects a key", tokens[0]),
            ["suc", ..] => eprintln!("Error: suc expects a key and a version"),
            ["imp", ..] => eprintln!("Error: imp expects at most a version"),
            [cmd, ..] => eprintln!("Error: unknown command {}", cmd),
        }
    }

    Ok(())
}

fn parse_i32(token: &str) -> Option<i32> {
    token.parse::<i32>().ok()
}

fn print_tree(index: &Index, ver: u64) {
    println!("\n version: {}\n", ver);
    let root = match index.root_at(ver) {
        Some(root) => root,
        None => return,
    };
    println!(" {}{}", index.key_of(root), paint(index.color_of(root, ver)));
    print_subtree(index, index.right_of(root, ver), ver, 8, false);
    print_subtree(index, index.left_of(root, ver), ver, 8, true);
}

fn print_subtree(index: &Index, node: Option<NodeId>, ver: u64, indent: usize, left: bool) {
    let node = match node {
        Some(node) => node,
        None => return,
    };
    println!(
        "{:indent$}{}{}{}",
        "",
        if left { "L" } else { "R" },
        index.key_of(node),
        paint(index.color_of(node, ver)),
        indent = indent
    );
    print_subtree(index, index.right_of(node, ver), ver, indent + 8, false);
    print_subtree(index, index.left_of(node, ver), ver, indent + 8, true);
}

fn paint(color: Color) -> &'static str {
    match color {
        Color::Black => " (B)",
        Color::Red => " (R)",
    }
}
