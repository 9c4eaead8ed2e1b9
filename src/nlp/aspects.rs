// Aspect/opinion extraction using seven dependency-pattern rules.
// Every rule runs over every token and all matches are kept; there is no
// first-match-wins. Pairs come out grouped by rule number, in token order.
use serde::{Serialize, Serializer};

use super::parse::{DepRel, ParsedClause, Pos, Token};

/// Subjects that refer back to the reviewed item.
pub const PRODUCT_PRONOUNS: [&str; 4] = ["it", "this", "they", "these"];

/// Aspect and opinion reported for clauses where no rule fires.
pub const NEUTRAL: &str = "neutral";

const PRODUCT: &str = "product";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleId {
    AdjectivalModifier = 1,
    DirectObject = 2,
    AdjectivalComplement = 3,
    AdverbialModifier = 4,
    CopularComplement = 5,
    Interjection = 6,
    Attribute = 7,
}

impl RuleId {
    pub const ALL: [RuleId; 7] = [
        RuleId::AdjectivalModifier,
        RuleId::DirectObject,
        RuleId::AdjectivalComplement,
        RuleId::AdverbialModifier,
        RuleId::CopularComplement,
        RuleId::Interjection,
        RuleId::Attribute,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }
}

impl Serialize for RuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AspectOpinionPair {
    pub aspect: String,
    pub opinion: String,
    pub rule: RuleId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pairs: Vec<AspectOpinionPair>,
}

impl ExtractionResult {
    pub fn pairs(&self) -> &[AspectOpinionPair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// (aspect, opinion) rows for downstream joins. An empty result becomes a
    /// single neutral row so the clause is never dropped.
    pub fn labels(&self) -> Vec<(&str, &str)> {
        if self.is_empty() {
            return vec![(NEUTRAL, NEUTRAL)];
        }
        self.pairs
            .iter()
            .map(|p| (p.aspect.as_str(), p.opinion.as_str()))
            .collect()
    }
}

// What the rules need to know about one token's children, computed in a single
// pass. "Last" fields keep the last matching child in surface order.
#[derive(Debug, Default, Clone, Copy)]
struct ChildIndex<'a> {
    first_advmod: Option<&'a Token>,
    has_no_determiner: bool,
    subject: Option<&'a Token>,
    any_subject: Option<&'a Token>,
    adjective_object: Option<&'a Token>,
    complement: Option<&'a Token>,
    adverb: Option<&'a Token>,
    attribute: Option<&'a Token>,
    copula: Option<&'a Token>,
    negation: Option<&'a str>,
    modal_negation: Option<&'a str>,
}

impl<'a> ChildIndex<'a> {
    fn build(clause: &'a ParsedClause, index: usize) -> Self {
        let mut ix = ChildIndex::default();
        for child in clause.children(index) {
            match child.dep {
                DepRel::Advmod => {
                    if ix.first_advmod.is_none() {
                        ix.first_advmod = Some(child);
                    }
                    if !child.is_stop {
                        ix.adverb = Some(child);
                    }
                }
                DepRel::Det if child.text == "no" => ix.has_no_determiner = true,
                DepRel::Nsubj if !child.is_stop => {
                    ix.subject = Some(child);
                    ix.any_subject = Some(child);
                }
                DepRel::NsubjPass if !child.is_stop => ix.any_subject = Some(child),
                DepRel::Dobj if child.pos == Pos::Adj && !child.is_stop => {
                    ix.adjective_object = Some(child)
                }
                DepRel::Acomp if !child.is_stop => ix.complement = Some(child),
                DepRel::Attr if !child.is_stop => ix.attribute = Some(child),
                DepRel::Cop if !child.is_stop => ix.copula = Some(child),
                DepRel::Aux if child.tag == "MD" => ix.modal_negation = Some("not"),
                DepRel::Neg => {
                    ix.negation = Some(child.text.as_str());
                    ix.modal_negation = Some(child.text.as_str());
                }
                _ => {}
            }
        }
        ix
    }
}

fn prefixed(prefix: Option<&str>, word: &str) -> String {
    match prefix {
        Some(prefix) => format!("{} {}", prefix, word),
        None => word.to_string(),
    }
}

fn make_pair(aspect: &str, opinion: String, rule: RuleId) -> Option<AspectOpinionPair> {
    if aspect.is_empty() || opinion.is_empty() {
        return None;
    }
    let aspect = if PRODUCT_PRONOUNS.contains(&aspect) {
        PRODUCT.to_string()
    } else {
        aspect.to_string()
    };
    Some(AspectOpinionPair { aspect, opinion, rule })
}

fn apply_rule(
    rule: RuleId,
    clause: &ParsedClause,
    token: &Token,
    index: &[ChildIndex<'_>],
) -> Option<AspectOpinionPair> {
    let ix = &index[token.index];
    match rule {
        RuleId::AdjectivalModifier => {
            if token.dep != DepRel::Amod || token.is_stop {
                return None;
            }
            let mut opinion = prefixed(ix.first_advmod.map(|t| t.text.as_str()), &token.text);
            let head = clause.head(token.index);
            if index[head.index].has_no_determiner {
                opinion = prefixed(Some("not"), &opinion);
            }
            make_pair(&head.text, opinion, rule)
        }
        RuleId::DirectObject => {
            let (subject, object) = (ix.subject?, ix.adjective_object?);
            make_pair(&subject.text, prefixed(ix.negation, &object.text), rule)
        }
        RuleId::AdjectivalComplement => {
            let (subject, complement) = (ix.subject?, ix.complement?);
            make_pair(&subject.text, prefixed(ix.modal_negation, &complement.text), rule)
        }
        RuleId::AdverbialModifier => {
            let (subject, adverb) = (ix.any_subject?, ix.adverb?);
            let stacked = index[adverb.index].first_advmod.map(|t| t.text.as_str());
            let opinion = prefixed(stacked, &adverb.text);
            make_pair(&subject.text, prefixed(ix.negation, &opinion), rule)
        }
        RuleId::CopularComplement => {
            let subject = ix.subject?;
            ix.copula?;
            make_pair(&subject.text, token.text.clone(), rule)
        }
        RuleId::Interjection => {
            if token.pos != Pos::Intj || token.is_stop {
                return None;
            }
            make_pair(&ix.subject?.text, token.text.clone(), rule)
        }
        RuleId::Attribute => {
            let (subject, attribute) = (ix.subject?, ix.attribute?);
            make_pair(&subject.text, prefixed(ix.negation, &attribute.text), rule)
        }
    }
}

/// Extract every (aspect, opinion, rule) triple from a parsed clause.
///
/// Never fails: a clause with no tokens, or where nothing matches, yields an
/// empty result.
pub fn extract(clause: &ParsedClause) -> ExtractionResult {
    let index: Vec<ChildIndex<'_>> = (0..clause.len())
        .map(|i| ChildIndex::build(clause, i))
        .collect();

    let pairs = RuleId::ALL
        .iter()
        .flat_map(|&rule| {
            let index = &index;
            clause
                .tokens()
                .iter()
                .filter_map(move |token| apply_rule(rule, clause, token, index))
        })
        .collect();

    ExtractionResult { pairs }
}
