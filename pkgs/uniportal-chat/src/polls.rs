//! Poll drafting, vote casting and tallying

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uniportal_store::{PollDocument, VoteValue};

use crate::error::{ChatError, Result};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollRejection {
    #[error("question is blank")]
    BlankQuestion,
    #[error("a poll needs at least two options")]
    TooFewOptions,
    #[error("option {0} is blank")]
    BlankOption(usize),
}

/// Poll composer input
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollDraft {
    pub question: String,
    pub options: Vec<String>,
    pub allow_multiple: bool,
}

impl PollDraft {
    pub fn validate(&self) -> std::result::Result<(), PollRejection> {
        if self.question.trim().is_empty() {
            return Err(PollRejection::BlankQuestion);
        }
        if self.options.len() < 2 {
            return Err(PollRejection::TooFewOptions);
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(PollRejection::BlankOption(index));
        }
        Ok(())
    }

    /// Validated, trimmed document with no votes
    pub fn into_document(self) -> std::result::Result<PollDocument, PollRejection> {
        self.validate()?;
        Ok(PollDocument {
            question: self.question.trim().to_string(),
            options: self
                .options
                .iter()
                .map(|option| option.trim().to_string())
                .collect(),
            allow_multiple: self.allow_multiple,
            votes: Default::default(),
        })
    }
}

/// Result line for one option
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OptionTally {
    pub option: String,
    pub votes: usize,
    /// Share of distinct voters who picked this option, 0 to 100
    pub percent: f64,
}

/// Voting on a poll document
pub trait PollVoting {
    /// Apply `voter`'s click on `option` and return their resulting choices
    ///
    /// Single-select: picks the option, or withdraws it when it was already
    /// the choice. Multi-select: toggles the option in the voter's set; an
    /// empty set removes the voter.
    fn cast(&mut self, voter: &str, option: usize) -> Result<Vec<usize>>;

    fn tally(&self) -> Vec<OptionTally>;

    fn choices_of(&self, voter: &str) -> Vec<usize>;

    fn voter_count(&self) -> usize;
}

impl PollVoting for PollDocument {
    fn cast(&mut self, voter: &str, option: usize) -> Result<Vec<usize>> {
        if option >= self.options.len() {
            return Err(ChatError::OptionOutOfRange {
                option,
                options: self.options.len(),
            });
        }

        if !self.allow_multiple {
            let withdraw = self
                .votes
                .get(voter)
                .map(|current| current.contains(option))
                .unwrap_or(false);
            if withdraw {
                self.votes.remove(voter);
            } else {
                self.votes.insert(voter.to_string(), VoteValue::One(option));
            }
            return Ok(self.choices_of(voter));
        }

        let mut chosen = self.choices_of(voter);
        match chosen.iter().position(|existing| *existing == option) {
            Some(index) => {
                chosen.remove(index);
            }
            None => chosen.push(option),
        }
        chosen.sort_unstable();
        chosen.dedup();

        if chosen.is_empty() {
            self.votes.remove(voter);
        } else {
            self.votes
                .insert(voter.to_string(), VoteValue::Many(chosen.clone()));
        }
        Ok(chosen)
    }

    fn tally(&self) -> Vec<OptionTally> {
        let voters = self.voter_count();
        self.options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                let votes = self
                    .votes
                    .values()
                    .filter(|value| value.contains(index))
                    .count();
                let percent = if voters == 0 {
                    0.0
                } else {
                    votes as f64 * 100.0 / voters as f64
                };
                OptionTally {
                    option: option.clone(),
                    votes,
                    percent,
                }
            })
            .collect()
    }

    fn choices_of(&self, voter: &str) -> Vec<usize> {
        self.votes
            .get(voter)
            .map(VoteValue::options)
            .unwrap_or_default()
    }

    fn voter_count(&self) -> usize {
        self.votes.len()
    }
}
