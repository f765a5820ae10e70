use std::io::Cursor;

use super::*;
use crate::Error;

#[test]
fn test_parse() {
    assert_eq!(Op::parse("INC 10").unwrap(), Some(Op::Inc(10)));
    assert_eq!(Op::parse("REM -3").unwrap(), Some(Op::Rem(-3)));
    assert_eq!(Op::parse("SUC 5 2").unwrap(), Some(Op::Suc(5, 2)));
    assert_eq!(Op::parse("IMP 4").unwrap(), Some(Op::Imp(4)));
    assert_eq!(Op::parse("   INC   10  ").unwrap(), Some(Op::Inc(10)));
    assert_eq!(Op::parse("").unwrap(), None);
    assert_eq!(Op::parse("   ").unwrap(), None);

    for line in ["INC", "INC 1 2", "REM", "SUC 5", "SUC", "IMP", "IMP 1 2"].iter() {
        match Op::parse(line) {
            Err(Error::InvalidFormat(_, _)) => (),
            res => panic!("unexpected {:?} for line {:?}", res, line),
        }
    }
    match Op::parse("DEL 5") {
        Err(Error::InvalidFormat(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match Op::parse("INC ten") {
        Err(Error::FailConvert(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match Op::parse("SUC 1 -2") {
        Err(Error::FailConvert(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_run() {
    let input = concat!(
        "INC 10\n",
        "INC 20\n",
        "INC 5\n",
        "SUC 10 3\n",
        "SUC 25 3\n",
        "SUC 5 1\n",
        "IMP 3\n",
        "IMP 0\n",
        "REM 10\n",
        "IMP 4\n",
        "\n",
        "INC 99\n",
    );
    let mut index = Index::new("test-run");
    let mut out: Vec<u8> = vec![];
    run(&mut index, Cursor::new(input), &mut out).unwrap();

    let want = concat!(
        "20\n",
        "Infinito\n",
        "Infinito\n",
        "5,1,R 10,0,N 20,1,R\n",
        "\n",
        "5,1,R 20,0,N\n",
    );
    assert_eq!(String::from_utf8(out).unwrap(), want);

    // the blank line ended the stream, INC 99 never ran.
    assert_eq!(index.len(), 2);
    assert!(index.search(99, u64::MAX).is_none());
}

#[test]
fn test_run_aborts() {
    // wrong arity aborts the stream.
    let mut index = Index::new("test-abort");
    let mut out: Vec<u8> = vec![];
    let res = run(&mut index, Cursor::new("INC 1\nSUC 1\nINC 2\n"), &mut out);
    assert!(matches!(res, Err(Error::InvalidFormat(_, _))));
    assert_eq!(index.len(), 1);

    // duplicate insert is a precondition violation, fatal for the
    // stream as well.
    let mut index = Index::new("test-abort-dup");
    let mut out: Vec<u8> = vec![];
    let res = run(&mut index, Cursor::new("INC 7\nINC 7\n"), &mut out);
    assert!(matches!(res, Err(Error::InvalidInput(_, _))));

    // unknown command aborts the stream.
    let mut index = Index::new("test-abort-unknown");
    let mut out: Vec<u8> = vec![];
    let res = run(&mut index, Cursor::new("NOP 1\n"), &mut out);
    assert!(matches!(res, Err(Error::InvalidFormat(_, _))));
}
