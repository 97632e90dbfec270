//! Consensus resolver
//!
//! Per position, readings are grouped by identical segment key and the
//! largest group wins. Equal-sized groups are separated by the best engine
//! rank among their members; if the ranks are equal too the position is
//! unresolved and shows the text of the earliest engine in priority order.
//!
//! The resolver only ever copies segments and separators out of the
//! readings, so every token of the output appears in some input.

use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::observability::{log_event_with_fields, Event};

use super::align::{align, AlignedPosition};
use super::errors::{ConsensusError, ConsensusOpResult};
use super::priority::EnginePriority;
use super::reading::EngineReading;
use super::segment::segments;
use super::thresholds::ConsensusThresholds;

/// Overall agreement tier of a consensus result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusTier {
    /// Every engine agrees at every position
    Unanimous,
    /// Enough engines agree at enough positions
    Majority,
    /// At least two engines agree somewhere
    Split,
    /// No two engines agree anywhere
    None,
}

impl ConsensusTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusTier::Unanimous => "unanimous",
            ConsensusTier::Majority => "majority",
            ConsensusTier::Split => "split",
            ConsensusTier::None => "none",
        }
    }
}

impl fmt::Display for ConsensusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence of a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionConfidence {
    High,
    Medium,
    Low,
}

/// What one engine read at a disagreement position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanReading {
    pub engine_id: String,
    pub text: String,
}

/// A position where engines did not all read the same segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisagreementSpan {
    pub position: usize,
    pub readings: Vec<SpanReading>,
    /// Engines whose reading ended before this position
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub abstained: Vec<String>,
    pub chosen: String,
    /// False when neither votes nor priority separated the candidates
    pub resolved: bool,
    /// `"<winning votes>/<total engines>"`
    pub agreement: String,
    pub confidence: PositionConfidence,
    pub reason: String,
}

/// A reading that took no part in alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedEngine {
    pub engine_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Outcome of one `resolve` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsensusResult {
    pub text: String,
    pub tier: ConsensusTier,
    /// Smallest winning vote count over all positions
    pub agreement_count: usize,
    /// Expected engines, including failed and missing ones
    pub total_engines: usize,
    pub positions: usize,
    pub unanimous_positions: usize,
    pub unresolved_positions: usize,
    pub confidence: ConfidenceCounts,
    pub engines_used: Vec<String>,
    pub excluded: Vec<ExcludedEngine>,
    pub disagreements: Vec<DisagreementSpan>,
}

impl ConsensusResult {
    /// Fraction of positions where every engine agreed.
    pub fn overall_confidence(&self) -> f64 {
        if self.positions == 0 {
            0.0
        } else {
            self.unanimous_positions as f64 / self.positions as f64
        }
    }

    /// Whether any two engines agreed anywhere
    pub fn is_verified(&self) -> bool {
        self.tier != ConsensusTier::None
    }
}

/// Candidate segment at one position and the readings that voted for it.
struct Group<'a> {
    key: Cow<'a, str>,
    /// Reading indexes, most preferred engine first
    members: Vec<usize>,
}

/// Merges engine readings for one page into a single text.
#[derive(Debug, Clone, Default)]
pub struct ConsensusResolver {
    priority: EnginePriority,
    thresholds: ConsensusThresholds,
    fold_case: bool,
}

impl ConsensusResolver {
    pub fn new(priority: EnginePriority, thresholds: ConsensusThresholds) -> ConsensusOpResult<Self> {
        thresholds.validate()?;
        Ok(Self {
            priority,
            thresholds,
            fold_case: false,
        })
    }

    /// Compare segments case-insensitively.
    pub fn with_fold_case(mut self, fold_case: bool) -> Self {
        self.fold_case = fold_case;
        self
    }

    pub fn priority(&self) -> &EnginePriority {
        &self.priority
    }

    pub fn thresholds(&self) -> &ConsensusThresholds {
        &self.thresholds
    }

    /// Resolve readings of one page.
    ///
    /// `engines_expected` is the number of engines that should have read
    /// the page; missing, failed and blank readings count against agreement.
    pub fn resolve(
        &self,
        readings: &[EngineReading],
        engines_expected: usize,
    ) -> ConsensusOpResult<ConsensusResult> {
        if readings.is_empty() {
            return Err(ConsensusError::InsufficientReadings);
        }
        validate_engine_ids(readings)?;

        let total = engines_expected.max(readings.len());
        let count = readings.len().to_string();
        let expected = total.to_string();
        log_event_with_fields(
            Event::ConsensusStart,
            &[("readings", count.as_str()), ("total_engines", expected.as_str())],
        );

        let mut excluded = Vec::new();
        let mut usable: Vec<&EngineReading> = Vec::new();
        for reading in readings {
            match reading.exclusion_reason() {
                Some(reason) => {
                    log_event_with_fields(
                        Event::EngineExcluded,
                        &[("engine", reading.engine_id.as_str()), ("reason", reason.as_str())],
                    );
                    excluded.push(ExcludedEngine {
                        engine_id: reading.engine_id.clone(),
                        reason,
                    });
                }
                None => usable.push(reading),
            }
        }

        let tokenized: Vec<_> = usable.iter().map(|r| segments(&r.text)).collect();
        let aligned = align(&tokenized);

        let mut text = String::new();
        let mut disagreements = Vec::new();
        let mut confidence = ConfidenceCounts::default();
        let mut agreement_count: Option<usize> = None;
        let mut unanimous_positions = 0;
        let mut majority_positions = 0;
        let mut unresolved_positions = 0;
        let mut any_agreement = false;

        for pos in &aligned {
            let groups = self.vote(pos, &usable);
            let Some(winner) = groups.first() else {
                continue;
            };
            let Some(chosen) = pos.cells[winner.members[0]] else {
                continue;
            };

            let votes = winner.members.len();
            let resolved = match groups.get(1) {
                None => true,
                Some(runner_up) => {
                    runner_up.members.len() < votes
                        || self.rank_of(&usable, runner_up) > self.rank_of(&usable, winner)
                }
            };

            text.push_str(chosen.text);
            text.push_str(pick_separator(pos, winner));

            agreement_count = Some(agreement_count.map_or(votes, |c| c.min(votes)));
            if votes == total {
                unanimous_positions += 1;
            }
            if self.thresholds.engines_agree(votes, total) {
                majority_positions += 1;
            }
            if votes >= 2 {
                any_agreement = true;
            }

            let level = if self.thresholds.engines_agree(votes, total) {
                PositionConfidence::High
            } else if votes >= 2 {
                PositionConfidence::Medium
            } else {
                PositionConfidence::Low
            };
            match level {
                PositionConfidence::High => confidence.high += 1,
                PositionConfidence::Medium => confidence.medium += 1,
                PositionConfidence::Low => confidence.low += 1,
            }

            if !resolved {
                unresolved_positions += 1;
                let position = pos.index.to_string();
                log_event_with_fields(
                    Event::PositionUnresolved,
                    &[("position", position.as_str()), ("chosen", chosen.text)],
                );
            }

            let abstained: Vec<String> = pos
                .abstained()
                .map(|i| usable[i].engine_id.clone())
                .collect();

            if groups.len() > 1 || !abstained.is_empty() {
                disagreements.push(DisagreementSpan {
                    position: pos.index,
                    readings: pos
                        .cells
                        .iter()
                        .enumerate()
                        .filter_map(|(i, cell)| {
                            cell.map(|seg| SpanReading {
                                engine_id: usable[i].engine_id.clone(),
                                text: seg.text.to_string(),
                            })
                        })
                        .collect(),
                    abstained,
                    chosen: chosen.text.to_string(),
                    resolved,
                    agreement: format!("{}/{}", votes, total),
                    confidence: level,
                    reason: reason(&groups, &usable, resolved, votes, total, level),
                });
            }
        }

        let trimmed = text.trim_end().len();
        text.truncate(trimmed);

        let positions = aligned.len();
        let tier = if positions > 0 && unanimous_positions == positions {
            ConsensusTier::Unanimous
        } else if positions > 0 && self.thresholds.positions_agree(majority_positions, positions) {
            ConsensusTier::Majority
        } else if any_agreement {
            ConsensusTier::Split
        } else {
            ConsensusTier::None
        };

        let result = ConsensusResult {
            text,
            tier,
            agreement_count: agreement_count.unwrap_or(0),
            total_engines: total,
            positions,
            unanimous_positions,
            unresolved_positions,
            confidence,
            engines_used: usable.iter().map(|r| r.engine_id.clone()).collect(),
            excluded,
            disagreements,
        };

        let positions = result.positions.to_string();
        let spans = result.disagreements.len().to_string();
        let agreement = format!("{}/{}", result.agreement_count, result.total_engines);
        log_event_with_fields(
            Event::ConsensusComplete,
            &[
                ("tier", result.tier.as_str()),
                ("agreement", agreement.as_str()),
                ("positions", positions.as_str()),
                ("disagreements", spans.as_str()),
            ],
        );
        if !result.is_verified() {
            log_event_with_fields(Event::ConsensusUnverified, &[("agreement", agreement.as_str())]);
        }

        Ok(result)
    }

    /// Groups at one position, winner first.
    fn vote<'a>(&self, pos: &AlignedPosition<'a>, engines: &[&EngineReading]) -> Vec<Group<'a>> {
        let mut groups: Vec<Group<'a>> = Vec::new();
        for (i, cell) in pos.cells.iter().enumerate() {
            let Some(seg) = cell else { continue };
            let key = seg.key(self.fold_case);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.members.push(i),
                None => groups.push(Group {
                    key,
                    members: vec![i],
                }),
            }
        }

        for group in &mut groups {
            group.members.sort_by_key(|&i| self.preference(engines, i));
        }
        groups.sort_by_key(|g| {
            (
                Reverse(g.members.len()),
                g.members.first().map(|&i| self.preference(engines, i)),
            )
        });
        groups
    }

    /// Sort key of a reading: rank, listed order, then input order.
    fn preference(&self, engines: &[&EngineReading], i: usize) -> (usize, usize, usize) {
        let id = engines[i].engine_id.as_str();
        (self.priority.rank(id), self.priority.order(id), i)
    }

    fn rank_of(&self, engines: &[&EngineReading], group: &Group<'_>) -> usize {
        group
            .members
            .first()
            .map_or(usize::MAX, |&i| self.priority.rank(&engines[i].engine_id))
    }
}

fn validate_engine_ids(readings: &[EngineReading]) -> ConsensusOpResult<()> {
    let mut seen = HashSet::new();
    for reading in readings {
        if reading.engine_id.trim().is_empty() {
            return Err(ConsensusError::invalid_reading("reading without engine id"));
        }
        if !seen.insert(reading.engine_id.as_str()) {
            return Err(ConsensusError::invalid_reading(format!(
                "engine '{}' supplied more than once",
                reading.engine_id
            )));
        }
    }
    Ok(())
}

/// Separator after the chosen segment.
///
/// Taken from the preferred winning reading. A segment only has an empty
/// separator when it ends its reading; if other readings continue, their
/// separator is borrowed so neighbouring segments are not glued together.
fn pick_separator<'a>(pos: &AlignedPosition<'a>, winner: &Group<'_>) -> &'a str {
    winner
        .members
        .iter()
        .copied()
        .chain(0..pos.cells.len())
        .filter_map(|i| pos.cells.get(i).copied().flatten())
        .map(|s| s.separator)
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

fn reason(
    groups: &[Group<'_>],
    engines: &[&EngineReading],
    resolved: bool,
    votes: usize,
    total: usize,
    level: PositionConfidence,
) -> String {
    let Some(winner) = groups.first() else {
        return "no readings".to_string();
    };
    let ids = winner
        .members
        .iter()
        .map(|&i| engines[i].engine_id.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    if !resolved {
        return "no consensus; flagged for review".to_string();
    }
    if votes == total {
        return format!("all {} engines agree", total);
    }
    let tied = groups.get(1).map_or(false, |g| g.members.len() == votes);
    if tied {
        format!("tie broken by engine priority ({})", ids)
    } else if votes == 1 {
        format!("single reading ({})", ids)
    } else if level == PositionConfidence::High {
        format!("majority agreement ({})", ids)
    } else {
        format!("plurality agreement ({})", ids)
    }
}
