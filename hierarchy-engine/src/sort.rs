//! FILENAME: hierarchy-engine/src/sort.rs
//! Case-insensitive, numeric-aware ordering for node labels.
//!
//! "Plant 2" sorts before "Plant 10", and "alpha" sits next to "Alpha".
//! Digit runs compare by numeric value; everything else compares by
//! lowercased character. Labels that are equal under those rules fall back to
//! a plain byte comparison so the order stays total and deterministic.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compares two labels in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match natural_cmp_loose(a, b) {
        Ordering::Equal => a.cmp(b),
        ord => ord,
    }
}

fn natural_cmp_loose(a: &str, b: &str) -> Ordering {
    let mut ia = a.chars().peekable();
    let mut ib = b.chars().peekable();

    loop {
        match (ia.peek().copied(), ib.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let da = take_digits(&mut ia);
                    let db = take_digits(&mut ib);
                    match compare_digit_runs(&da, &db) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }

                let la = ca.to_lowercase();
                let lb = cb.to_lowercase();
                match la.cmp(lb) {
                    Ordering::Equal => {
                        ia.next();
                        ib.next();
                    }
                    ord => return ord,
                }
            }
        }
    }
}

fn take_digits(iter: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = iter.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        iter.next();
    }
    run
}

/// Compares digit runs by value without parsing, so arbitrarily long runs work.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let ta = a.trim_start_matches('0');
    let tb = b.trim_start_matches('0');
    ta.len()
        .cmp(&tb.len())
        .then_with(|| ta.cmp(tb))
        // "007" after "7" when values tie
        .then_with(|| a.len().cmp(&b.len()))
}
