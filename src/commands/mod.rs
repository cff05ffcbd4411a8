pub mod append;
pub mod bzmpop;
pub mod bzpop;
pub mod client;
pub mod command;
pub mod config;
pub mod dbsize;
pub mod decr;
pub mod decrby;
pub mod del;
pub mod discard;
pub mod echo;
pub mod exec;
pub mod executable;
pub mod exists;
pub mod expire;
pub mod flushall;
pub mod flushdb;
pub mod get;
pub mod getdel;
pub mod getex;
pub mod getrange;
pub mod getset;
pub mod hello;
pub mod incr;
pub mod incrby;
pub mod incrbyfloat;
pub mod info;
pub mod keys;
pub mod lcs;
pub mod llen;
pub mod lrange;
pub mod mget;
pub mod mset;
pub mod msetnx;
pub mod multi;
pub mod object;
pub mod persist;
pub mod ping;
pub mod pop;
pub mod pttl;
pub mod push;
pub mod sadd;
pub mod scard;
pub mod select;
pub mod set;
pub mod setnx;
pub mod setop;
pub mod setrange;
pub mod sintercard;
pub mod sismember;
pub mod smembers;
pub mod smismember;
pub mod smove;
pub mod spop;
pub mod srandmember;
pub mod srem;
pub mod strlen;
pub mod ttl;
pub mod type_;
pub mod watch;
pub mod zadd;
pub mod zcard;
pub mod zcount;
pub mod zincrby;
pub mod zintercard;
pub mod zlexcount;
pub mod zmpop;
pub mod zpop;
pub mod zrange;
pub mod zrank;
pub mod zrem;
pub mod zremrangebylex;
pub mod zremrangebyrank;
pub mod zremrangebyscore;
pub mod zscore;
pub mod zsetop;

use bytes::Bytes;
use itertools::Itertools;
use std::{str, vec};
use thiserror::Error as ThisError;
use tokio::time::Duration;

use crate::client::Client as Session;
use crate::commands::executable::BlockingExecutable;
use crate::frame::Frame;
use crate::server::{Outcome, Redis};
use crate::skiplist::BoundError;
use crate::store::Keyspace;
use crate::Error;

use append::Append;
use bzmpop::Bzmpop;
use bzpop::Bzpop;
use client::Client;
use command::Command as Command_;
use config::Config;
use dbsize::DBSize;
use decr::Decr;
use decrby::DecrBy;
use del::Del;
use discard::Discard;
use echo::Echo;
use exec::Exec;
use exists::Exists;
use expire::Expire;
use flushall::Flushall;
use flushdb::Flushdb;
use get::Get;
use getdel::Getdel;
use getex::Getex;
use getrange::Getrange;
use getset::Getset;
use hello::Hello;
use incr::Incr;
use incrby::IncrBy;
use incrbyfloat::IncrByFloat;
use info::Info;
use keys::Keys;
use lcs::Lcs;
use llen::Llen;
use lrange::Lrange;
use mget::Mget;
use mset::Mset;
use msetnx::Msetnx;
use multi::Multi;
use object::Object;
use persist::Persist;
use ping::Ping;
use pop::Pop;
use pttl::Pttl;
use push::Push;
use sadd::Sadd;
use scard::Scard;
use select::Select;
use set::Set;
use setnx::Setnx;
use setop::{SetOp, Setop};
use setrange::Setrange;
use sintercard::Sintercard;
use sismember::Sismember;
use smembers::Smembers;
use smismember::Smismember;
use smove::Smove;
use spop::Spop;
use srandmember::Srandmember;
use srem::Srem;
use strlen::Strlen;
use ttl::Ttl;
use type_::Type;
use watch::Watch;
use zadd::Zadd;
use zcard::Zcard;
use zcount::Zcount;
use zincrby::Zincrby;
use zintercard::Zintercard;
use zlexcount::Zlexcount;
use zmpop::Zmpop;
use zpop::{Side, Zpop};
use zrange::Zrange;
use zrank::Zrank;
use zrem::Zrem;
use zremrangebylex::Zremrangebylex;
use zremrangebyrank::Zremrangebyrank;
use zremrangebyscore::Zremrangebyscore;
use zscore::Zscore;
use zsetop::Zsetop;

/// Every command name the server understands, as reported by `COMMAND`.
pub const COMMAND_NAMES: &[&str] = &[
    "append",
    "bzmpop",
    "bzpopmax",
    "bzpopmin",
    "client",
    "command",
    "config",
    "dbsize",
    "decr",
    "decrby",
    "del",
    "discard",
    "echo",
    "exec",
    "exists",
    "expire",
    "flushall",
    "flushdb",
    "get",
    "getdel",
    "getex",
    "getrange",
    "getset",
    "hello",
    "incr",
    "incrby",
    "incrbyfloat",
    "info",
    "keys",
    "lcs",
    "llen",
    "lpop",
    "lpush",
    "lrange",
    "mget",
    "mset",
    "msetnx",
    "multi",
    "object",
    "persist",
    "pexpire",
    "ping",
    "psetex",
    "pttl",
    "rpop",
    "rpush",
    "sadd",
    "scard",
    "sdiff",
    "sdiffstore",
    "select",
    "set",
    "setex",
    "setnx",
    "setrange",
    "sinter",
    "sintercard",
    "sinterstore",
    "sismember",
    "smembers",
    "smismember",
    "smove",
    "spop",
    "srandmember",
    "srem",
    "strlen",
    "sunion",
    "sunionstore",
    "ttl",
    "type",
    "watch",
    "zadd",
    "zcard",
    "zcount",
    "zdiff",
    "zdiffstore",
    "zincrby",
    "zinter",
    "zintercard",
    "zinterstore",
    "zlexcount",
    "zmpop",
    "zpopmax",
    "zpopmin",
    "zrange",
    "zrangebylex",
    "zrangebyscore",
    "zrank",
    "zrem",
    "zremrangebylex",
    "zremrangebyrank",
    "zremrangebyscore",
    "zrevrange",
    "zrevrangebylex",
    "zrevrangebyscore",
    "zrevrank",
    "zscore",
    "zunion",
    "zunionstore",
];

#[derive(Debug, PartialEq)]
pub enum Command {
    Append(Append),
    DBsize(DBSize),
    Decr(Decr),
    DecrBy(DecrBy),
    Del(Del),
    Exists(Exists),
    Expire(Expire),
    Flushdb(Flushdb),
    Get(Get),
    Getdel(Getdel),
    Getex(Getex),
    Getrange(Getrange),
    Getset(Getset),
    Incr(Incr),
    IncrBy(IncrBy),
    IncrByFloat(IncrByFloat),
    Keys(Keys),
    Lcs(Lcs),
    Llen(Llen),
    Lrange(Lrange),
    Mget(Mget),
    Mset(Mset),
    Msetnx(Msetnx),
    Object(Object),
    Persist(Persist),
    Pop(Pop),
    Pttl(Pttl),
    Push(Push),
    Sadd(Sadd),
    Scard(Scard),
    Set(Set),
    Setnx(Setnx),
    Setop(Setop),
    Setrange(Setrange),
    Sintercard(Sintercard),
    Sismember(Sismember),
    Smembers(Smembers),
    Smismember(Smismember),
    Smove(Smove),
    Spop(Spop),
    Srandmember(Srandmember),
    Srem(Srem),
    Strlen(Strlen),
    Ttl(Ttl),
    Type(Type),
    Zadd(Zadd),
    Zcard(Zcard),
    Zcount(Zcount),
    Zincrby(Zincrby),
    Zintercard(Zintercard),
    Zlexcount(Zlexcount),
    Zmpop(Zmpop),
    Zpop(Zpop),
    Zrange(Zrange),
    Zrank(Zrank),
    Zrem(Zrem),
    Zremrangebylex(Zremrangebylex),
    Zremrangebyrank(Zremrangebyrank),
    Zremrangebyscore(Zremrangebyscore),
    Zscore(Zscore),
    Zsetop(Zsetop),

    Bzmpop(Bzmpop),
    Bzpop(Bzpop),

    Client(Client),
    Command(Command_),
    Config(Config),
    Discard(Discard),
    Echo(Echo),
    Exec(Exec),
    Flushall(Flushall),
    Hello(Hello),
    Info(Info),
    Multi(Multi),
    Ping(Ping),
    Select(Select),
    Watch(Watch),
}

/// The commands that can wait for data, kept by a database while they wait.
#[derive(Debug, PartialEq)]
pub enum BlockingCommand {
    Bzmpop(Bzmpop),
    Bzpop(Bzpop),
}

impl BlockingExecutable for BlockingCommand {
    fn try_exec(&self, db: &mut Keyspace) -> Result<Option<Frame>, Error> {
        match self {
            BlockingCommand::Bzmpop(cmd) => cmd.try_exec(db),
            BlockingCommand::Bzpop(cmd) => cmd.try_exec(db),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        match self {
            BlockingCommand::Bzmpop(cmd) => cmd.timeout(),
            BlockingCommand::Bzpop(cmd) => cmd.timeout(),
        }
    }
}

impl Command {
    /// Whether the command may change the keyspace, and so may unblock waiting commands.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Append(_)
                | Command::Decr(_)
                | Command::DecrBy(_)
                | Command::Del(_)
                | Command::Expire(_)
                | Command::Flushdb(_)
                | Command::Getdel(_)
                | Command::Getex(_)
                | Command::Getset(_)
                | Command::Incr(_)
                | Command::IncrBy(_)
                | Command::IncrByFloat(_)
                | Command::Mset(_)
                | Command::Msetnx(_)
                | Command::Persist(_)
                | Command::Pop(_)
                | Command::Push(_)
                | Command::Sadd(_)
                | Command::Set(_)
                | Command::Setnx(_)
                | Command::Setop(_)
                | Command::Setrange(_)
                | Command::Smove(_)
                | Command::Spop(_)
                | Command::Srem(_)
                | Command::Zadd(_)
                | Command::Zincrby(_)
                | Command::Zmpop(_)
                | Command::Zpop(_)
                | Command::Zrem(_)
                | Command::Zremrangebylex(_)
                | Command::Zremrangebyrank(_)
                | Command::Zremrangebyscore(_)
                | Command::Zsetop(_)
                | Command::Bzmpop(_)
                | Command::Bzpop(_)
        )
    }

    pub(crate) fn dispatch(self, redis: &Redis, client: &mut Session) -> Outcome {
        let write = self.is_write();

        match self {
            Command::Append(cmd) => redis.exec(client, cmd, write),
            Command::DBsize(cmd) => redis.exec(client, cmd, write),
            Command::Decr(cmd) => redis.exec(client, cmd, write),
            Command::DecrBy(cmd) => redis.exec(client, cmd, write),
            Command::Del(cmd) => redis.exec(client, cmd, write),
            Command::Exists(cmd) => redis.exec(client, cmd, write),
            Command::Expire(cmd) => redis.exec(client, cmd, write),
            Command::Flushdb(cmd) => redis.exec(client, cmd, write),
            Command::Get(cmd) => redis.exec(client, cmd, write),
            Command::Getdel(cmd) => redis.exec(client, cmd, write),
            Command::Getex(cmd) => redis.exec(client, cmd, write),
            Command::Getrange(cmd) => redis.exec(client, cmd, write),
            Command::Getset(cmd) => redis.exec(client, cmd, write),
            Command::Incr(cmd) => redis.exec(client, cmd, write),
            Command::IncrBy(cmd) => redis.exec(client, cmd, write),
            Command::IncrByFloat(cmd) => redis.exec(client, cmd, write),
            Command::Keys(cmd) => redis.exec(client, cmd, write),
            Command::Lcs(cmd) => redis.exec(client, cmd, write),
            Command::Llen(cmd) => redis.exec(client, cmd, write),
            Command::Lrange(cmd) => redis.exec(client, cmd, write),
            Command::Mget(cmd) => redis.exec(client, cmd, write),
            Command::Mset(cmd) => redis.exec(client, cmd, write),
            Command::Msetnx(cmd) => redis.exec(client, cmd, write),
            Command::Object(cmd) => redis.exec(client, cmd, write),
            Command::Persist(cmd) => redis.exec(client, cmd, write),
            Command::Pop(cmd) => redis.exec(client, cmd, write),
            Command::Pttl(cmd) => redis.exec(client, cmd, write),
            Command::Push(cmd) => redis.exec(client, cmd, write),
            Command::Sadd(cmd) => redis.exec(client, cmd, write),
            Command::Scard(cmd) => redis.exec(client, cmd, write),
            Command::Set(cmd) => redis.exec(client, cmd, write),
            Command::Setnx(cmd) => redis.exec(client, cmd, write),
            Command::Setop(cmd) => redis.exec(client, cmd, write),
            Command::Setrange(cmd) => redis.exec(client, cmd, write),
            Command::Sintercard(cmd) => redis.exec(client, cmd, write),
            Command::Sismember(cmd) => redis.exec(client, cmd, write),
            Command::Smembers(cmd) => redis.exec(client, cmd, write),
            Command::Smismember(cmd) => redis.exec(client, cmd, write),
            Command::Smove(cmd) => redis.exec(client, cmd, write),
            Command::Spop(cmd) => redis.exec(client, cmd, write),
            Command::Srandmember(cmd) => redis.exec(client, cmd, write),
            Command::Srem(cmd) => redis.exec(client, cmd, write),
            Command::Strlen(cmd) => redis.exec(client, cmd, write),
            Command::Ttl(cmd) => redis.exec(client, cmd, write),
            Command::Type(cmd) => redis.exec(client, cmd, write),
            Command::Zadd(cmd) => redis.exec(client, cmd, write),
            Command::Zcard(cmd) => redis.exec(client, cmd, write),
            Command::Zcount(cmd) => redis.exec(client, cmd, write),
            Command::Zincrby(cmd) => redis.exec(client, cmd, write),
            Command::Zintercard(cmd) => redis.exec(client, cmd, write),
            Command::Zlexcount(cmd) => redis.exec(client, cmd, write),
            Command::Zmpop(cmd) => redis.exec(client, cmd, write),
            Command::Zpop(cmd) => redis.exec(client, cmd, write),
            Command::Zrange(cmd) => redis.exec(client, cmd, write),
            Command::Zrank(cmd) => redis.exec(client, cmd, write),
            Command::Zrem(cmd) => redis.exec(client, cmd, write),
            Command::Zremrangebylex(cmd) => redis.exec(client, cmd, write),
            Command::Zremrangebyrank(cmd) => redis.exec(client, cmd, write),
            Command::Zremrangebyscore(cmd) => redis.exec(client, cmd, write),
            Command::Zscore(cmd) => redis.exec(client, cmd, write),
            Command::Zsetop(cmd) => redis.exec(client, cmd, write),

            Command::Bzmpop(cmd) => redis.block(client, BlockingCommand::Bzmpop(cmd)),
            Command::Bzpop(cmd) => redis.block(client, BlockingCommand::Bzpop(cmd)),

            Command::Client(cmd) => redis.exec_server(client, cmd),
            Command::Command(cmd) => redis.exec_server(client, cmd),
            Command::Config(cmd) => redis.exec_server(client, cmd),
            Command::Discard(cmd) => redis.exec_server(client, cmd),
            Command::Echo(cmd) => redis.exec_server(client, cmd),
            Command::Exec(cmd) => redis.exec_server(client, cmd),
            Command::Flushall(cmd) => redis.exec_server(client, cmd),
            Command::Hello(cmd) => redis.exec_server(client, cmd),
            Command::Info(cmd) => redis.exec_server(client, cmd),
            Command::Multi(cmd) => redis.exec_server(client, cmd),
            Command::Ping(cmd) => redis.exec_server(client, cmd),
            Command::Select(cmd) => redis.exec_server(client, cmd),
            Command::Watch(cmd) => redis.exec_server(client, cmd),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandParserError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        let parser = &mut CommandParser {
            command: String::new(),
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;
        parser.command.clone_from(&command_name);

        let command = match &command_name[..] {
            "append" => Append::try_from(&mut *parser).map(Command::Append),
            "bzmpop" => Bzmpop::try_from(&mut *parser).map(Command::Bzmpop),
            "bzpopmax" => Bzpop::parse(parser, Side::Max).map(Command::Bzpop),
            "bzpopmin" => Bzpop::parse(parser, Side::Min).map(Command::Bzpop),
            "client" => Client::try_from(&mut *parser).map(Command::Client),
            "command" => Command_::try_from(&mut *parser).map(Command::Command),
            "config" => Config::try_from(&mut *parser).map(Command::Config),
            "dbsize" => DBSize::try_from(&mut *parser).map(Command::DBsize),
            "decr" => Decr::try_from(&mut *parser).map(Command::Decr),
            "decrby" => DecrBy::try_from(&mut *parser).map(Command::DecrBy),
            "del" => Del::try_from(&mut *parser).map(Command::Del),
            "discard" => Discard::try_from(&mut *parser).map(Command::Discard),
            "echo" => Echo::try_from(&mut *parser).map(Command::Echo),
            "exec" => Exec::try_from(&mut *parser).map(Command::Exec),
            "exists" => Exists::try_from(&mut *parser).map(Command::Exists),
            "expire" => Expire::parse(parser, Duration::from_secs(1)).map(Command::Expire),
            "flushall" => Flushall::try_from(&mut *parser).map(Command::Flushall),
            "flushdb" => Flushdb::try_from(&mut *parser).map(Command::Flushdb),
            "get" => Get::try_from(&mut *parser).map(Command::Get),
            "getdel" => Getdel::try_from(&mut *parser).map(Command::Getdel),
            "getex" => Getex::try_from(&mut *parser).map(Command::Getex),
            "getrange" => Getrange::try_from(&mut *parser).map(Command::Getrange),
            "getset" => Getset::try_from(&mut *parser).map(Command::Getset),
            "hello" => Hello::try_from(&mut *parser).map(Command::Hello),
            "incr" => Incr::try_from(&mut *parser).map(Command::Incr),
            "incrby" => IncrBy::try_from(&mut *parser).map(Command::IncrBy),
            "incrbyfloat" => IncrByFloat::try_from(&mut *parser).map(Command::IncrByFloat),
            "info" => Info::try_from(&mut *parser).map(Command::Info),
            "keys" => Keys::try_from(&mut *parser).map(Command::Keys),
            "lcs" => Lcs::try_from(&mut *parser).map(Command::Lcs),
            "llen" => Llen::try_from(&mut *parser).map(Command::Llen),
            "lpop" => Pop::parse(parser, push::End::Front).map(Command::Pop),
            "lpush" => Push::parse(parser, push::End::Front).map(Command::Push),
            "lrange" => Lrange::try_from(&mut *parser).map(Command::Lrange),
            "mget" => Mget::try_from(&mut *parser).map(Command::Mget),
            "mset" => Mset::try_from(&mut *parser).map(Command::Mset),
            "msetnx" => Msetnx::try_from(&mut *parser).map(Command::Msetnx),
            "multi" => Multi::try_from(&mut *parser).map(Command::Multi),
            "object" => Object::try_from(&mut *parser).map(Command::Object),
            "persist" => Persist::try_from(&mut *parser).map(Command::Persist),
            "pexpire" => Expire::parse(parser, Duration::from_millis(1)).map(Command::Expire),
            "ping" => Ping::try_from(&mut *parser).map(Command::Ping),
            "psetex" => Set::setex(parser, 1).map(Command::Set),
            "pttl" => Pttl::try_from(&mut *parser).map(Command::Pttl),
            "rpop" => Pop::parse(parser, push::End::Back).map(Command::Pop),
            "rpush" => Push::parse(parser, push::End::Back).map(Command::Push),
            "sadd" => Sadd::try_from(&mut *parser).map(Command::Sadd),
            "scard" => Scard::try_from(&mut *parser).map(Command::Scard),
            "sdiff" => Setop::parse(parser, SetOp::Diff, false).map(Command::Setop),
            "sdiffstore" => Setop::parse(parser, SetOp::Diff, true).map(Command::Setop),
            "select" => Select::try_from(&mut *parser).map(Command::Select),
            "set" => Set::try_from(&mut *parser).map(Command::Set),
            "setex" => Set::setex(parser, 1000).map(Command::Set),
            "setnx" => Setnx::try_from(&mut *parser).map(Command::Setnx),
            "setrange" => Setrange::try_from(&mut *parser).map(Command::Setrange),
            "sinter" => Setop::parse(parser, SetOp::Inter, false).map(Command::Setop),
            "sintercard" => Sintercard::try_from(&mut *parser).map(Command::Sintercard),
            "sinterstore" => Setop::parse(parser, SetOp::Inter, true).map(Command::Setop),
            "sismember" => Sismember::try_from(&mut *parser).map(Command::Sismember),
            "smembers" => Smembers::try_from(&mut *parser).map(Command::Smembers),
            "smismember" => Smismember::try_from(&mut *parser).map(Command::Smismember),
            "smove" => Smove::try_from(&mut *parser).map(Command::Smove),
            "spop" => Spop::try_from(&mut *parser).map(Command::Spop),
            "srandmember" => Srandmember::try_from(&mut *parser).map(Command::Srandmember),
            "srem" => Srem::try_from(&mut *parser).map(Command::Srem),
            "strlen" => Strlen::try_from(&mut *parser).map(Command::Strlen),
            "sunion" => Setop::parse(parser, SetOp::Union, false).map(Command::Setop),
            "sunionstore" => Setop::parse(parser, SetOp::Union, true).map(Command::Setop),
            "ttl" => Ttl::try_from(&mut *parser).map(Command::Ttl),
            "type" => Type::try_from(&mut *parser).map(Command::Type),
            "watch" => Watch::try_from(&mut *parser).map(Command::Watch),
            "zadd" => Zadd::try_from(&mut *parser).map(Command::Zadd),
            "zcard" => Zcard::try_from(&mut *parser).map(Command::Zcard),
            "zcount" => Zcount::try_from(&mut *parser).map(Command::Zcount),
            "zdiff" => Zsetop::parse(parser, SetOp::Diff, false).map(Command::Zsetop),
            "zdiffstore" => Zsetop::parse(parser, SetOp::Diff, true).map(Command::Zsetop),
            "zincrby" => Zincrby::try_from(&mut *parser).map(Command::Zincrby),
            "zinter" => Zsetop::parse(parser, SetOp::Inter, false).map(Command::Zsetop),
            "zintercard" => Zintercard::try_from(&mut *parser).map(Command::Zintercard),
            "zinterstore" => Zsetop::parse(parser, SetOp::Inter, true).map(Command::Zsetop),
            "zlexcount" => Zlexcount::try_from(&mut *parser).map(Command::Zlexcount),
            "zmpop" => Zmpop::try_from(&mut *parser).map(Command::Zmpop),
            "zpopmax" => Zpop::parse(parser, Side::Max).map(Command::Zpop),
            "zpopmin" => Zpop::parse(parser, Side::Min).map(Command::Zpop),
            "zrange" => Zrange::try_from(&mut *parser).map(Command::Zrange),
            "zrangebylex" => Zrange::by_lex(parser, false).map(Command::Zrange),
            "zrangebyscore" => Zrange::by_score(parser, false).map(Command::Zrange),
            "zrank" => Zrank::parse(parser, false).map(Command::Zrank),
            "zrem" => Zrem::try_from(&mut *parser).map(Command::Zrem),
            "zremrangebylex" => {
                Zremrangebylex::try_from(&mut *parser).map(Command::Zremrangebylex)
            }
            "zremrangebyrank" => {
                Zremrangebyrank::try_from(&mut *parser).map(Command::Zremrangebyrank)
            }
            "zremrangebyscore" => {
                Zremrangebyscore::try_from(&mut *parser).map(Command::Zremrangebyscore)
            }
            "zrevrange" => Zrange::by_rank_reversed(parser).map(Command::Zrange),
            "zrevrangebylex" => Zrange::by_lex(parser, true).map(Command::Zrange),
            "zrevrangebyscore" => Zrange::by_score(parser, true).map(Command::Zrange),
            "zrevrank" => Zrank::parse(parser, true).map(Command::Zrank),
            "zscore" => Zscore::try_from(&mut *parser).map(Command::Zscore),
            "zunion" => Zsetop::parse(parser, SetOp::Union, false).map(Command::Zsetop),
            "zunionstore" => Zsetop::parse(parser, SetOp::Union, true).map(Command::Zsetop),
            _ => Err(CommandParserError::UnknownCommand {
                args: parser.describe_remaining(),
                command: command_name.clone(),
            }),
        };

        // Running out of arguments while parsing means the command got too few of them.
        command.map_err(|err| match err {
            CommandParserError::EndOfStream => CommandParserError::WrongNumberOfArguments {
                command: command_name,
            },
            err => err,
        })
    }
}

pub(crate) struct CommandParser {
    command: String,
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Name of the command being parsed, lowercased.
    pub(crate) fn command(&self) -> &str {
        &self.command
    }

    pub(crate) fn has_next(&self) -> bool {
        self.parts.len() > 0
    }

    pub(crate) fn remaining(&self) -> usize {
        self.parts.len()
    }

    /// Fails with an arity error when arguments are left over.
    pub(crate) fn finish(&self) -> Result<(), CommandParserError> {
        if self.has_next() {
            return Err(CommandParserError::WrongNumberOfArguments {
                command: self.command.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            Frame::Integer(i) => Ok(i.to_string()),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Next argument uppercased, for matching option names.
    pub(crate) fn next_keyword(&mut self) -> Result<String, CommandParserError> {
        self.next_string().map(|s| s.to_uppercase())
    }

    pub(crate) fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => string
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(CommandParserError::InvalidUTF8String)?
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    /// A count argument, which must not be negative.
    pub(crate) fn next_count(&mut self) -> Result<usize, CommandParserError> {
        let count = self.next_integer()?;
        usize::try_from(count).map_err(|_| CommandParserError::NotPositive)
    }

    /// A float argument. NaN is never a valid argument.
    pub(crate) fn next_float(&mut self) -> Result<f64, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        let value = match frame {
            Frame::Integer(i) => i as f64,
            Frame::Double(d) => d,
            Frame::Simple(string) => parse_float(string.as_bytes())?,
            Frame::Bulk(bytes) => parse_float(&bytes)?,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "float".to_string(),
                    actual: frame,
                })
            }
        };

        if value.is_nan() {
            return Err(CommandParserError::NotAFloat);
        }
        Ok(value)
    }

    /// A blocking timeout in seconds. Zero means no timeout.
    pub(crate) fn next_timeout(&mut self) -> Result<Option<Duration>, CommandParserError> {
        let seconds = self
            .next_float()
            .map_err(|err| match err {
                CommandParserError::NotAFloat => CommandParserError::InvalidTimeout,
                err => err,
            })?;

        if seconds < 0.0 {
            return Err(CommandParserError::NegativeTimeout);
        }
        if seconds == 0.0 {
            return Ok(None);
        }

        Duration::try_from_secs_f64(seconds)
            .map(Some)
            .map_err(|_| CommandParserError::InvalidTimeout)
    }

    pub(crate) fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            Frame::Integer(i) => Ok(Bytes::from(i.to_string())),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Reads `count` keys, as used by the `numkeys key [key ...]` commands.
    pub(crate) fn next_keys(&mut self, count: usize) -> Result<Vec<String>, CommandParserError> {
        if count == 0 {
            return Err(CommandParserError::InvalidArgument(
                "numkeys should be greater than 0".to_string(),
            ));
        }
        (0..count).map(|_| self.next_string()).collect()
    }

    /// Reads strings until the arguments run out.
    pub(crate) fn rest_strings(&mut self) -> Result<Vec<String>, CommandParserError> {
        let mut strings = Vec::with_capacity(self.remaining());
        while self.has_next() {
            strings.push(self.next_string()?);
        }
        Ok(strings)
    }

    pub(crate) fn rest_bytes(&mut self) -> Result<Vec<Bytes>, CommandParserError> {
        let mut values = Vec::with_capacity(self.remaining());
        while self.has_next() {
            values.push(self.next_bytes()?);
        }
        Ok(values)
    }

    fn describe_remaining(&self) -> String {
        self.parts
            .as_slice()
            .iter()
            .map(|frame| match frame {
                Frame::Bulk(bytes) => format!("'{}'", String::from_utf8_lossy(bytes)),
                Frame::Simple(s) => format!("'{}'", s),
                frame => format!("'{}'", frame),
            })
            .join(" ")
    }
}

fn parse_float(bytes: &[u8]) -> Result<f64, CommandParserError> {
    str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or(CommandParserError::NotAFloat)
}

/// Errors found while turning a request into a [`Command`]. Nothing has been executed when one
/// of these is returned, and the message is sent back to the client as is.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR Protocol error: expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unknown command '{command}', with args beginning with: {args}")]
    UnknownCommand { command: String, args: String },
    #[error("ERR unknown subcommand '{}'. Try {} HELP.", .subcommand, .command.to_uppercase())]
    UnknownSubcommand { command: String, subcommand: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongNumberOfArguments { command: String },
    #[error("ERR invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error("ERR value is out of range, must be positive")]
    NotPositive,
    #[error("ERR syntax error")]
    Syntax,
    #[error("{0}")]
    InvalidBound(#[from] BoundError),
    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("ERR timeout is negative")]
    NegativeTimeout,
    #[error("ERR invalid expire time in '{command}' command")]
    InvalidExpireTime { command: String },
    #[error("ERR {0}")]
    InvalidArgument(String),
    #[error("ERR wrong number of arguments")]
    EndOfStream,
}

/// Errors raised while executing a command.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
    #[error("ERR increment would produce NaN or Infinity")]
    NanOrInfinity,
    #[error("ERR resulting score is not a number (NaN)")]
    NanScore,
    #[error("ERR string exceeds maximum allowed size (proto-max-bulk-len)")]
    StringTooLong,
    #[error("ERR Insufficient memory, transient memory for LCS exceeds proto-max-bulk-len")]
    LcsTooLarge,
    #[error("ERR DB index is out of range")]
    DbIndexOutOfRange,
    #[error("NOPROTO unsupported protocol version")]
    UnsupportedProtocol,
}

#[cfg(test)]
pub(crate) mod harness {
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use crate::client::Client;
    use crate::config::Config;
    use crate::frame::Frame;
    use crate::server::{Outcome, Redis};
    use crate::skiplist::SkipList;
    use crate::store::Keyspace;
    use crate::value::Value;

    /// Runs requests through the real dispatcher with an in memory client.
    pub(crate) struct Harness {
        pub redis: Redis,
        pub client: Client,
        replies: UnboundedReceiver<Frame>,
    }

    impl Harness {
        pub fn new() -> Harness {
            let redis = Redis::new(&Config::default());
            let (tx, replies) = mpsc::unbounded_channel();
            let client = redis.new_client(tx);
            Harness {
                redis,
                client,
                replies,
            }
        }

        pub fn frame(args: &[&str]) -> Frame {
            Frame::Array(
                args.iter()
                    .map(|arg| Frame::Bulk(bytes::Bytes::copy_from_slice(arg.as_bytes())))
                    .collect(),
            )
        }

        /// Dispatches a request that must complete right away and returns its reply.
        pub fn run(&mut self, args: &[&str]) -> Frame {
            match self.redis.dispatch(&mut self.client, Self::frame(args)) {
                Outcome::Done => self.reply().expect("no reply was sent"),
                Outcome::Blocked(_) => panic!("{:?} blocked", args),
            }
        }

        pub fn reply(&mut self) -> Option<Frame> {
            self.replies.try_recv().ok()
        }

        pub fn with_db<R>(&self, f: impl FnOnce(&mut Keyspace) -> R) -> R {
            let db = self.redis.databases().get(self.client.db()).unwrap();
            let mut state = db.lock();
            f(&mut state.keyspace)
        }

        pub fn set_zset(&self, key: &str, members: &[(&str, f64)]) {
            let mut zset = SkipList::new();
            for (member, score) in members {
                zset.insert(member, *score);
            }
            self.with_db(|db| db.set(key.to_string(), Value::SortedSet(zset), None));
        }
    }

    pub(crate) fn bulk(s: &str) -> Frame {
        Frame::Bulk(bytes::Bytes::copy_from_slice(s.as_bytes()))
    }

    pub(crate) fn bulks(items: &[&str]) -> Frame {
        Frame::Array(items.iter().map(|s| bulk(s)).collect())
    }

    pub(crate) fn ok() -> Frame {
        Frame::Simple("OK".to_string())
    }

    pub(crate) fn error(msg: &str) -> Frame {
        Frame::Error(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get_command_with_simple_string() {
        let get_frame = Frame::Array(vec![
            Frame::Simple(String::from("GET")),
            Frame::Simple(String::from("foo")),
        ]);

        let get_command = Command::try_from(get_frame).unwrap();

        assert_eq!(
            get_command,
            Command::Get(Get {
                key: String::from("foo")
            })
        );
    }

    #[test]
    fn parse_get_command_with_bulk_string() {
        let get_frame = Frame::Array(vec![
            Frame::Simple(String::from("GET")),
            Frame::Bulk(Bytes::from("foo-from-bytes")),
        ]);

        let get_command = Command::try_from(get_frame).unwrap();

        assert_eq!(
            get_command,
            Command::Get(Get {
                key: String::from("foo-from-bytes")
            })
        );
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let frame = harness::Harness::frame(&["gEt", "k"]);

        assert_eq!(
            Command::try_from(frame).unwrap(),
            Command::Get(Get {
                key: String::from("k")
            })
        );
    }

    #[test]
    fn parse_non_array_frame() {
        let err = Command::try_from(Frame::Simple("GET".to_string())).unwrap_err();

        assert_eq!(
            err,
            CommandParserError::InvalidFrame {
                expected: "array".to_string(),
                actual: Frame::Simple("GET".to_string()),
            }
        );
    }

    #[test]
    fn parse_unknown_command() {
        let err = Command::try_from(harness::Harness::frame(&["FOO", "a", "b"])).unwrap_err();

        assert_eq!(
            err.to_string(),
            "ERR unknown command 'foo', with args beginning with: 'a' 'b'"
        );
    }

    #[test]
    fn missing_arguments_are_an_arity_error() {
        let err = Command::try_from(harness::Harness::frame(&["GET"])).unwrap_err();

        assert_eq!(
            err.to_string(),
            "ERR wrong number of arguments for 'get' command"
        );

        let err = Command::try_from(harness::Harness::frame(&["GET", "a", "b"])).unwrap_err();

        assert_eq!(
            err,
            CommandParserError::WrongNumberOfArguments {
                command: "get".to_string()
            }
        );
    }

    #[test]
    fn every_listed_command_is_known() {
        for name in COMMAND_NAMES {
            let result = Command::try_from(harness::Harness::frame(&[name]));
            assert!(
                !matches!(result, Err(CommandParserError::UnknownCommand { .. })),
                "{} is listed but unknown",
                name
            );
        }
    }

    #[test]
    fn write_flags() {
        let is_write = |args: &[&str]| {
            Command::try_from(harness::Harness::frame(args))
                .unwrap()
                .is_write()
        };

        assert!(is_write(&["SINTERSTORE", "out", "a"]));
        assert!(is_write(&["ZUNIONSTORE", "out", "1", "a"]));
        assert!(is_write(&["SETEX", "k", "10", "v"]));
        assert!(!is_write(&["GET", "k"]));
        // Runs on the server, outside any single database.
        assert!(!is_write(&["FLUSHALL"]));
    }

    #[test]
    fn timeouts() {
        let parse = |timeout: &str| {
            let mut parser = CommandParser {
                command: "bzpopmin".to_string(),
                parts: vec![Frame::Bulk(Bytes::copy_from_slice(timeout.as_bytes()))].into_iter(),
            };
            parser.next_timeout()
        };

        assert_eq!(parse("0"), Ok(None));
        assert_eq!(parse("1.5"), Ok(Some(Duration::from_millis(1500))));
        assert_eq!(parse("-1"), Err(CommandParserError::NegativeTimeout));
        assert_eq!(parse("abc"), Err(CommandParserError::InvalidTimeout));
    }
}
