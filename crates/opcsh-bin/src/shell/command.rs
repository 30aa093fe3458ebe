// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shell command parsing.
//!
//! A line is split at the first space into a keyword and an optional
//! argument. Keywords are case-sensitive; the argument is taken verbatim so
//! display names containing spaces can be used with `cd` and `read`.

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Nothing to do.
    Empty,
    /// `help`
    Help,
    /// `exit`
    Exit,
    /// `connect <address>`
    Connect(Option<String>),
    /// `disconnect`
    Disconnect,
    /// `ls`
    List,
    /// `cd <name>`
    ChangeDir(Option<String>),
    /// `cd ..`
    Parent,
    /// `read [<name>]`
    Read(Option<String>),
    /// `write`
    Write,
    /// Anything else.
    Unknown(String),
}

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let (keyword, argument) = match line.split_once(' ') {
            Some((keyword, rest)) => (keyword, Some(rest)),
            None => (line, None),
        };
        let argument = argument.filter(|a| !a.is_empty()).map(str::to_string);

        match keyword {
            "" => Self::Empty,
            "help" => Self::Help,
            "exit" => Self::Exit,
            "connect" => Self::Connect(argument),
            "disconnect" => Self::Disconnect,
            "ls" => Self::List,
            "cd" if argument.as_deref() == Some("..") => Self::Parent,
            "cd" => Self::ChangeDir(argument),
            "read" => Self::Read(argument),
            "write" => Self::Write,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("exit"), Command::Exit);
        assert_eq!(Command::parse("ls"), Command::List);
        assert_eq!(Command::parse("disconnect"), Command::Disconnect);
        assert_eq!(Command::parse("write"), Command::Write);
        assert_eq!(Command::parse("read"), Command::Read(None));
    }

    #[test]
    fn test_arguments_are_verbatim() {
        assert_eq!(
            Command::parse("connect opc.tcp://localhost:4840"),
            Command::Connect(Some("opc.tcp://localhost:4840".into()))
        );
        assert_eq!(
            Command::parse("cd Server Status"),
            Command::ChangeDir(Some("Server Status".into()))
        );
        assert_eq!(
            Command::parse("read Speed\r\n"),
            Command::Read(Some("Speed".into()))
        );
    }

    #[test]
    fn test_cd_forms() {
        assert_eq!(Command::parse("cd .."), Command::Parent);
        assert_eq!(Command::parse("cd"), Command::ChangeDir(None));
        assert_eq!(Command::parse("cd "), Command::ChangeDir(None));
        assert_eq!(Command::parse("cd ../x"), Command::ChangeDir(Some("../x".into())));
    }

    #[test]
    fn test_empty_and_unknown() {
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse(" ls"), Command::Empty);
        assert_eq!(Command::parse("LS"), Command::Unknown("LS".into()));
        assert_eq!(Command::parse("Read"), Command::Unknown("Read".into()));
    }
}
