//! Module implement the line-oriented command protocol.
//!
//! One command per line, tokens separated by whitespace:
//!
//! | command   | effect                                             |
//! |-----------|----------------------------------------------------|
//! | `INC k`   | insert key `k`                                     |
//! | `REM k`   | remove key `k`                                     |
//! | `SUC k v` | write successor of `k` at version `v`, one line    |
//! | `IMP v`   | write the serialized tree at version `v`, one line |
//!
//! A blank line ends the stream. A successor of `i32::MAX` is written
//! as the literal `Infinito`.

use std::io::{BufRead, Write};

use crate::{rbt::Index, Result};

/// Single command in the text protocol.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Op {
    Inc(i32),
    Rem(i32),
    Suc(i32, u64),
    Imp(u64),
}

impl Op {
    /// Parse one line into a command, `None` for a blank line. Wrong
    /// arity and unknown commands are [InvalidFormat][e], unparseable
    /// numbers are [FailConvert][e] errors.
    ///
    /// [e]: crate::Error
    pub fn parse(line: &str) -> Result<Option<Op>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let op = match tokens.as_slice() {
            [] => return Ok(None),
            ["INC", key] => Op::Inc(parse_i32(key)?),
            ["REM", key] => Op::Rem(parse_i32(key)?),
            ["SUC", key, ver] => Op::Suc(parse_i32(key)?, parse_u64(ver)?),
            ["IMP", ver] => Op::Imp(parse_u64(ver)?),
            ["INC", ..] | ["REM", ..] => {
                return err_at!(InvalidFormat, msg: "{} expects a single key", tokens[0])
            }
            ["SUC", ..] => {
                return err_at!(InvalidFormat, msg: "SUC expects a key and a version")
            }
            ["IMP", ..] => return err_at!(InvalidFormat, msg: "IMP expects a version"),
            [cmd, ..] => return err_at!(InvalidFormat, msg: "unknown command {}", cmd),
        };
        Ok(Some(op))
    }
}

fn parse_i32(token: &str) -> Result<i32> {
    err_at!(FailConvert, token.parse::<i32>(), "token {:?}", token)
}

fn parse_u64(token: &str) -> Result<u64> {
    err_at!(FailConvert, token.parse::<u64>(), "token {:?}", token)
}

/// Execute a stream of commands against `index`, writing `SUC` and
/// `IMP` results into `out`. A blank line ends the stream; any error,
/// from the input, from parsing or from the index, aborts it.
pub fn run<R, W>(index: &mut Index, input: R, out: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = err_at!(IOError, line)?;
        let op = match Op::parse(&line)? {
            Some(op) => op,
            None => break,
        };
        match op {
            Op::Inc(key) => {
                index.insert(key)?;
            }
            Op::Rem(key) => {
                index.remove(key)?;
            }
            Op::Suc(key, ver) => match index.successor(key, ver) {
                i32::MAX => err_at!(IOError, writeln!(out, "Infinito"))?,
                succ => err_at!(IOError, writeln!(out, "{}", succ))?,
            },
            Op::Imp(ver) => index.dump(ver, out)?,
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "op_test.rs"]
mod op_test;
