//! Console command parsing

use thiserror::Error;
use votemute_domain::{ChannelId, DomainError, MuteDuration, ProposalId, SubjectId};

pub const HELP: &str = "\
Commands:
  join <subject> <channel> [bot]   put a member (or bot) in a channel
  leave <subject>                  remove a member from its channel
  mute <subject> <duration>        mute directly (e.g. 30s, 1m, 1.5m, 45)
  unmute <subject>                 lift a mute early
  votemute <target> <duration>     open a vote to mute target
  vote <proposal> <voter>          vote on an open proposal (e.g. vote #1 alice)
  unvote <proposal> <voter>        withdraw a vote
  roulette <invoker>               mute a random member of the invoker's channel
  status [subject]                 show channels, mutes and open votes
  wait <duration>                  let time pass
  fail-next-apply                  make the next mute fail at the provider
  fail-next-remove                 make the next unmute fail at the provider
  help                             show this list
  quit                             leave the console";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join {
        subject: SubjectId,
        channel: ChannelId,
        bot: bool,
    },
    Leave(SubjectId),
    Mute(SubjectId, MuteDuration),
    Unmute(SubjectId),
    VoteMute(SubjectId, MuteDuration),
    Vote(ProposalId, SubjectId),
    Unvote(ProposalId, SubjectId),
    Roulette(SubjectId),
    Status(Option<SubjectId>),
    Wait(MuteDuration),
    FailNextApply,
    FailNextRemove,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}', type 'help' for the list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid duration: {0}")]
    Duration(#[from] DomainError),

    #[error("invalid proposal id '{0}'")]
    Proposal(String),
}

impl Command {
    /// Parse one console line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = (words[0].to_lowercase(), &words[1..]);

        let command = match (name.as_str(), args) {
            ("join", [subject, channel]) => Command::Join {
                subject: SubjectId::from(*subject),
                channel: ChannelId::from(*channel),
                bot: false,
            },
            ("join", [subject, channel, "bot"]) => Command::Join {
                subject: SubjectId::from(*subject),
                channel: ChannelId::from(*channel),
                bot: true,
            },
            ("join", _) => return Err(ParseError::Usage("join <subject> <channel> [bot]")),

            ("leave", [subject]) => Command::Leave(SubjectId::from(*subject)),
            ("leave", _) => return Err(ParseError::Usage("leave <subject>")),

            ("mute", [subject, duration]) => {
                Command::Mute(SubjectId::from(*subject), MuteDuration::parse(duration)?)
            }
            ("mute", _) => return Err(ParseError::Usage("mute <subject> <duration>")),

            ("unmute", [subject]) => Command::Unmute(SubjectId::from(*subject)),
            ("unmute", _) => return Err(ParseError::Usage("unmute <subject>")),

            ("votemute", [target, duration]) => {
                Command::VoteMute(SubjectId::from(*target), MuteDuration::parse(duration)?)
            }
            ("votemute", _) => return Err(ParseError::Usage("votemute <target> <duration>")),

            ("vote", [proposal, voter]) => {
                Command::Vote(parse_proposal(proposal)?, SubjectId::from(*voter))
            }
            ("vote", _) => return Err(ParseError::Usage("vote <proposal> <voter>")),

            ("unvote", [proposal, voter]) => {
                Command::Unvote(parse_proposal(proposal)?, SubjectId::from(*voter))
            }
            ("unvote", _) => return Err(ParseError::Usage("unvote <proposal> <voter>")),

            ("roulette", [invoker]) => Command::Roulette(SubjectId::from(*invoker)),
            ("roulette", _) => return Err(ParseError::Usage("roulette <invoker>")),

            ("status", []) => Command::Status(None),
            ("status", [subject]) => Command::Status(Some(SubjectId::from(*subject))),
            ("status", _) => return Err(ParseError::Usage("status [subject]")),

            ("wait", [duration]) => Command::Wait(MuteDuration::parse(duration)?),
            ("wait", _) => return Err(ParseError::Usage("wait <duration>")),

            ("fail-next-apply", []) => Command::FailNextApply,
            ("fail-next-remove", []) => Command::FailNextRemove,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,

            (other, _) => return Err(ParseError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn parse_proposal(s: &str) -> Result<ProposalId, ParseError> {
    s.parse().map_err(|_| ParseError::Proposal(s.to_string()))
}
