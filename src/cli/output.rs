//! Terminal output helpers

use colored::*;
use std::fmt::Display;

/// Format a number with thousands separators
pub fn format_number<T: Display>(n: T) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for c in s.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg.green());
}

pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg.yellow());
}

/// Prints a titled section of key/value lines as a tree.
pub fn tree_section(title: &str, items: &[(&str, String)], last: bool) {
    let prefix = if last { "└─" } else { "├─" };
    println!("{} {}", prefix, title.bold());

    let indent = if last { "   " } else { "│  " };
    for (i, (key, value)) in items.iter().enumerate() {
        let item_prefix = if i == items.len() - 1 { "└─" } else { "├─" };
        println!("{}  {} {}: {}", indent, item_prefix, key, value);
    }
}
