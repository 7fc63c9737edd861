//! # Template Scanning
//!
//! A minimal `{{ ... }}` template language used by the load pipeline as a
//! reference collector: resource fields may embed calls like
//! `{{param "message"}}` or `{{lookup "task.a.status"}}`, and dependency
//! resolution needs to observe which calls a field makes, not to render
//! anything.
//!
//! A [`Language`] maps function names to handlers. The default language
//! registers no-op stubs for every supported function; the resolver swaps
//! in recording handlers (see [`remember_calls`]) and executes each field
//! against a discarded sink. Unknown functions and malformed actions are
//! parse errors; handler behavior never fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Name of the cross-reference function
pub const REF_FUNC_NAME: &str = "lookup";

/// Name of the parameter lookup function
pub const PARAM_FUNC_NAME: &str = "param";

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("Template syntax error in {source_text:?}: {reason}")]
    Syntax { source_text: String, reason: String },

    #[error("Unknown template function {function:?} in {source_text:?}")]
    UnknownFunction {
        function: String,
        source_text: String,
    },
}

/// A template function: receives evaluated arguments, returns the rendered
/// replacement. Handlers never fail; harvesting tolerates nonsense input.
pub type TemplateFn = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// Registry of template functions
#[derive(Clone)]
pub struct Language {
    funcs: HashMap<String, TemplateFn>,
}

impl Default for Language {
    /// The default language: every supported function as a no-op stub
    fn default() -> Self {
        let mut language = Self {
            funcs: HashMap::new(),
        };
        for name in [
            PARAM_FUNC_NAME,
            REF_FUNC_NAME,
            "env",
            "platform",
            "split",
            "join",
            "default",
        ] {
            language.on(name, stub());
        }
        language
    }
}

impl Language {
    /// Installs (or replaces) a function by name
    pub fn on(&mut self, name: impl Into<String>, func: TemplateFn) {
        self.funcs.insert(name.into(), func);
    }

    fn get(&self, name: &str) -> Option<&TemplateFn> {
        self.funcs.get(name)
    }
}

/// A no-op handler returning the empty string
pub fn stub() -> TemplateFn {
    Arc::new(|_| String::new())
}

/// A handler that records its argument at `arg` into the shared buffer and
/// renders nothing. Calls with fewer arguments record nothing.
pub fn remember_calls(calls: &Arc<Mutex<Vec<String>>>, arg: usize) -> TemplateFn {
    let calls = Arc::clone(calls);
    Arc::new(move |args| {
        if let Some(value) = args.get(arg) {
            if let Ok(mut calls) = calls.lock() {
                calls.push(value.clone());
            }
        }
        String::new()
    })
}

/// One function invocation found in a template
#[derive(Debug, Clone, PartialEq)]
struct Call {
    func: String,
    args: Vec<String>,
}

/// A parsed template, reduced to the calls it makes.
///
/// Literal text and non-call actions (`{{.field}}`) parse fine and are
/// simply not retained; execution only drives function handlers.
#[derive(Debug)]
pub struct Template {
    calls: Vec<Call>,
}

impl Template {
    /// Parses `source`, validating every referenced function against the
    /// language. Malformed actions and unknown functions are fatal.
    pub fn parse(source: &str, language: &Language) -> Result<Self, TemplateError> {
        let syntax = |reason: &str| TemplateError::Syntax {
            source_text: source.to_string(),
            reason: reason.to_string(),
        };

        let mut calls = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| syntax("unclosed action"))?;
            let action = &after[..end];

            for command in split_pipeline(action, source)? {
                let mut tokens = command.into_iter();
                let head = match tokens.next() {
                    Some(token) => token,
                    None => continue, // empty pipeline stage, nothing to run
                };

                match head {
                    Token::Bare(name) if is_identifier(&name) => {
                        if language.get(&name).is_none() {
                            return Err(TemplateError::UnknownFunction {
                                function: name,
                                source_text: source.to_string(),
                            });
                        }
                        let args = tokens
                            .map(|token| match token {
                                Token::Quoted(s) => s,
                                // variables and literals render as nothing
                                // during harvesting
                                Token::Bare(_) => String::new(),
                            })
                            .collect();
                        calls.push(Call { func: name, args });
                    }
                    // `.field`, `$var`, bare literals: valid, not a call
                    _ => {}
                }
            }

            rest = &after[end + 2..];
        }

        Ok(Self { calls })
    }

    /// Runs every call against the language, discarding rendered output.
    pub fn execute(&self, language: &Language) {
        for call in &self.calls {
            if let Some(func) = language.get(&call.func) {
                func(&call.args);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Bare(String),
    Quoted(String),
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits an action into pipeline stages, each a list of tokens.
fn split_pipeline(action: &str, source: &str) -> Result<Vec<Vec<Token>>, TemplateError> {
    let mut stages = vec![Vec::new()];
    let mut chars = action.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '|' => stages.push(Vec::new()),
            '"' => {
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => {
                                return Err(TemplateError::Syntax {
                                    source_text: source.to_string(),
                                    reason: "unterminated string".to_string(),
                                })
                            }
                        },
                        Some('"') => break,
                        Some(c) => value.push(c),
                        None => {
                            return Err(TemplateError::Syntax {
                                source_text: source.to_string(),
                                reason: "unterminated string".to_string(),
                            })
                        }
                    }
                }
                if let Some(stage) = stages.last_mut() {
                    stage.push(Token::Quoted(value));
                }
            }
            c => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == '|' || next == '"' {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                if let Some(stage) = stages.last_mut() {
                    stage.push(Token::Bare(word));
                }
            }
        }
    }

    Ok(stages)
}
