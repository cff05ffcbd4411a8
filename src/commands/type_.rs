use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the string representation of the type of the value stored at `key`.
///
/// The types this server can return are: `string`, `list`, `set` and `zset`. If the key does not
/// exist, `none` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: String,
}

impl Executable for Type {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let type_ = db
            .get(&self.key)
            .map(|value| value.kind().to_string())
            .unwrap_or_else(|| "none".to_string());

        Ok(Frame::Simple(type_))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::Harness;

    #[test]
    fn every_kind() {
        let mut h = Harness::new();
        h.run(&["SET", "string", "1"]);
        h.run(&["RPUSH", "list", "1"]);
        h.run(&["SADD", "set", "1"]);
        h.run(&["ZADD", "zset", "1", "one"]);

        for (key, kind) in [
            ("string", "string"),
            ("list", "list"),
            ("set", "set"),
            ("zset", "zset"),
            ("missing", "none"),
        ] {
            assert_eq!(h.run(&["TYPE", key]), Frame::Simple(kind.to_string()));
        }
    }
}
