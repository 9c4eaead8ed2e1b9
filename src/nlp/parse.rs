// Dependency-parse data model and readers for externally produced parses.
// The crate never parses English itself: a parser (spaCy, UDPipe, ...) dumps its
// output as JSON or CoNLL-U and the pipeline looks clauses up by text.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ReviewError};

/// Coarse universal part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    X,
}

impl Pos {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "ADJ" => Pos::Adj,
            "ADP" => Pos::Adp,
            "ADV" => Pos::Adv,
            "AUX" => Pos::Aux,
            "CCONJ" | "CONJ" => Pos::Cconj,
            "DET" => Pos::Det,
            "INTJ" => Pos::Intj,
            "NOUN" => Pos::Noun,
            "NUM" => Pos::Num,
            "PART" => Pos::Part,
            "PRON" => Pos::Pron,
            "PROPN" => Pos::Propn,
            "PUNCT" => Pos::Punct,
            "SCONJ" => Pos::Sconj,
            "SYM" => Pos::Sym,
            "VERB" => Pos::Verb,
            "SPACE" => Pos::Space,
            _ => Pos::X,
        }
    }
}

/// Dependency relation. Only the labels the extraction rules look at get their
/// own variant; everything else is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepRel {
    Amod,
    Advmod,
    Det,
    Nsubj,
    NsubjPass,
    Dobj,
    Neg,
    Acomp,
    Aux,
    Cop,
    Attr,
    Root,
    Other(String),
}

impl DepRel {
    /// Accepts ClearNLP-style labels as emitted by spaCy plus the UD spellings
    /// `obj` and `nsubj:pass`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "amod" => DepRel::Amod,
            "advmod" => DepRel::Advmod,
            "det" => DepRel::Det,
            "nsubj" => DepRel::Nsubj,
            "nsubjpass" | "nsubj:pass" => DepRel::NsubjPass,
            "dobj" | "obj" => DepRel::Dobj,
            "neg" => DepRel::Neg,
            "acomp" => DepRel::Acomp,
            "aux" => DepRel::Aux,
            "cop" => DepRel::Cop,
            "attr" => DepRel::Attr,
            "root" => DepRel::Root,
            _ => DepRel::Other(label.to_string()),
        }
    }

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub index: usize,
    pub text: String,
    pub lemma: String,
    pub pos: Pos,
    /// Fine-grained tag, e.g. `MD` for modal verbs.
    pub tag: String,
    pub dep: DepRel,
    /// Index of the head token within the clause. The root points at itself.
    pub head: usize,
    pub is_stop: bool,
}

impl Token {
    pub fn new(text: &str, pos: Pos, dep: DepRel, head: usize) -> Self {
        Self {
            index: 0,
            text: text.to_string(),
            lemma: text.to_lowercase(),
            pos,
            tag: String::new(),
            dep,
            head,
            is_stop: false,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn with_lemma(mut self, lemma: &str) -> Self {
        self.lemma = lemma.to_string();
        self
    }

    #[cfg(test)]
    pub fn stop(mut self) -> Self {
        self.is_stop = true;
        self
    }
}

/// A clause and its dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClause {
    text: String,
    tokens: Vec<Token>,
    children: Vec<Vec<usize>>,
}

impl ParsedClause {
    /// Validate and index a parse. Heads must be in range, exactly one token may
    /// be its own head, and every token must reach that root.
    pub fn new(text: &str, mut tokens: Vec<Token>) -> Result<Self> {
        let malformed = |message: String| ReviewError::MalformedParse {
            clause: text.to_string(),
            message,
        };

        let n = tokens.len();
        let mut children = vec![Vec::new(); n];
        let mut root = None;
        for (i, token) in tokens.iter_mut().enumerate() {
            token.index = i;
            if token.head >= n {
                return Err(malformed(format!(
                    "token {} ({:?}) has head {} outside 0..{}",
                    i, token.text, token.head, n
                )));
            }
            if token.head == i {
                if let Some(existing) = root {
                    return Err(malformed(format!("two roots: tokens {} and {}", existing, i)));
                }
                root = Some(i);
            } else {
                children[token.head].push(i);
            }
        }

        if let Some(root) = root {
            for start in 0..n {
                let mut current = start;
                let mut steps = 0;
                while current != root {
                    current = tokens[current].head;
                    steps += 1;
                    if steps > n {
                        return Err(malformed(format!("token {} is part of a head cycle", start)));
                    }
                }
            }
        } else if n > 0 {
            return Err(malformed("no root token".to_string()));
        }

        Ok(Self {
            text: text.to_string(),
            tokens,
            children,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Children of `index` in surface order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = &Token> + '_ {
        self.children[index].iter().map(move |&c| &self.tokens[c])
    }

    pub fn head(&self, index: usize) -> &Token {
        &self.tokens[self.tokens[index].head]
    }
}

// JSON dump format: one object per clause, heads are clause-relative indices.
#[derive(Debug, Serialize, Deserialize)]
struct ClauseRecord {
    text: String,
    tokens: Vec<TokenRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    text: String,
    #[serde(default)]
    lemma: Option<String>,
    pos: String,
    #[serde(default)]
    tag: String,
    dep: String,
    head: usize,
    #[serde(default)]
    is_stop: bool,
}

impl From<TokenRecord> for Token {
    fn from(record: TokenRecord) -> Self {
        let lemma = record.lemma.unwrap_or_else(|| record.text.to_lowercase());
        Token {
            index: 0,
            text: record.text,
            lemma,
            pos: Pos::from_tag(&record.pos),
            tag: record.tag,
            dep: DepRel::from_label(&record.dep),
            head: record.head,
            is_stop: record.is_stop,
        }
    }
}

// A clause whose tree does not validate is left out of the dump; looking it up
// later yields `MissingParse`, so only that clause goes without pairs.
fn keep_valid(parsed: Result<ParsedClause>, clauses: &mut Vec<ParsedClause>) {
    match parsed {
        Ok(clause) => clauses.push(clause),
        Err(e) => warn!(error = %e, "skipping malformed parse"),
    }
}

/// Parse JSON dumped by the external parser. Clauses with an invalid tree are
/// skipped with a warning.
pub fn read_json_parses(content: &str) -> Result<Vec<ParsedClause>> {
    let records: Vec<ClauseRecord> = serde_json::from_str(content)?;
    let mut clauses = Vec::with_capacity(records.len());
    for record in records {
        let tokens = record.tokens.into_iter().map(Token::from).collect();
        keep_valid(ParsedClause::new(&record.text, tokens), &mut clauses);
    }
    Ok(clauses)
}

/// Parse CoNLL-U. `# text = ...` names the clause, HEAD 0 marks the root and
/// `Stop=Yes` in MISC sets the stopword flag. A sentence whose tree does not
/// validate is skipped with a warning; bad columns or ids are errors.
pub fn read_conllu(content: &str) -> Result<Vec<ParsedClause>> {
    let mut clauses = Vec::new();
    let mut text: Option<String> = None;
    let mut tokens: Vec<Token> = Vec::new();

    let mut flush = |text: &mut Option<String>, tokens: &mut Vec<Token>| {
        if tokens.is_empty() {
            *text = None;
            return;
        }
        let clause_text = text.take().unwrap_or_else(|| {
            tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ")
        });
        keep_valid(ParsedClause::new(&clause_text, std::mem::take(tokens)), &mut clauses);
    };

    for (line_no, line) in content.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            flush(&mut text, &mut tokens);
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if let Some(value) = comment.trim_start().strip_prefix("text =") {
                text = Some(value.trim().to_string());
            }
            continue;
        }

        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() != 10 {
            return Err(ReviewError::Conllu {
                line: line_no,
                message: format!("expected 10 columns, found {}", cols.len()),
            });
        }
        // multiword ranges and empty nodes carry no tree information
        if cols[0].contains('-') || cols[0].contains('.') {
            continue;
        }
        let id: usize = cols[0].parse().map_err(|_| ReviewError::Conllu {
            line: line_no,
            message: format!("bad token id {:?}", cols[0]),
        })?;
        let head: usize = cols[6].parse().map_err(|_| ReviewError::Conllu {
            line: line_no,
            message: format!("bad head {:?}", cols[6]),
        })?;
        if id != tokens.len() + 1 {
            return Err(ReviewError::Conllu {
                line: line_no,
                message: format!("token id {} out of sequence", id),
            });
        }

        let index = id - 1;
        let head = if head == 0 { index } else { head - 1 };
        let tag = if cols[4] == "_" { "" } else { cols[4] };
        let mut token =
            Token::new(cols[1], Pos::from_tag(cols[3]), DepRel::from_label(cols[7]), head).with_tag(tag);
        if cols[2] != "_" {
            token = token.with_lemma(cols[2]);
        }
        token.is_stop = cols[9].split('|').any(|field| field == "Stop=Yes");
        tokens.push(token);
    }
    flush(&mut text, &mut tokens);

    Ok(clauses)
}

/// Source of dependency parses for clause text.
pub trait DependencyParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<ParsedClause>;
}

/// Parses loaded from a dump, looked up by clause text.
#[derive(Debug, Default, Clone)]
pub struct ParseTable {
    clauses: Vec<ParsedClause>,
    by_text: HashMap<String, usize>,
}

impl ParseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_clauses(clauses: Vec<ParsedClause>) -> Self {
        let mut table = Self::new();
        for clause in clauses {
            table.insert(clause);
        }
        table
    }

    /// Load a `.json` or `.conllu`/`.conll` dump.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let clauses = match ext {
            "json" => read_json_parses(&content)?,
            "conllu" | "conll" => read_conllu(&content)?,
            _ => return Err(ReviewError::UnsupportedFormat(ext.to_string())),
        };
        let table = Self::from_clauses(clauses);
        debug!(path = %path.display(), clauses = table.len(), "loaded parses");
        Ok(table)
    }

    /// Add a parse. The first parse for a given text wins.
    pub fn insert(&mut self, clause: ParsedClause) {
        if self.by_text.contains_key(clause.text()) {
            debug!(text = clause.text(), "duplicate parse ignored");
            return;
        }
        self.by_text.insert(clause.text().to_string(), self.clauses.len());
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[ParsedClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }
}

impl DependencyParser for ParseTable {
    fn parse(&self, text: &str) -> Result<ParsedClause> {
        self.by_text
            .get(text)
            .map(|&i| self.clauses[i].clone())
            .ok_or_else(|| ReviewError::MissingParse(text.to_string()))
    }
}
