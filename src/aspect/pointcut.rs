//! Pointcut patterns.
//!
//! A pattern is either a bare type pattern, which intercepts every call on
//! instances of matching types, or an executable pattern:
//!
//! ```text
//! [modifiers...] [return-type] Type.method(arg, arg, ...)
//! public void pkg.Type.angry(..)
//! * pkg.*.new(string)
//! ```
//!
//! `*` matches any run of characters inside one dot-separated segment (a lone
//! `*` matches any name), `..` as the only argument matches any argument list,
//! and `new` names constructors.

use parking_lot::Mutex;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

use crate::aspect::handler::{HandlerRef, Passthrough, handler_from_value};
use crate::context::Context;
use crate::core::WireError;
use crate::meta::{Executable, Modifiers};

/// A compiled executable pattern.
#[derive(Debug, Clone)]
struct ExecutablePattern {
    modifiers: Modifiers,
    return_type: Regex,
    target_type: Regex,
    method: Regex,
    params: Option<Vec<Regex>>,
}

#[derive(Debug, Clone)]
enum Matcher {
    WholeType(Regex),
    Executable(Box<ExecutablePattern>),
}

/// A compiled pattern plus the handler it binds.
pub struct PointCut {
    pattern: String,
    matcher: Matcher,
    handler: Option<HandlerRef>,
    handler_builder: Option<String>,
    handler_type: Option<String>,
    bound: OnceLock<HandlerRef>,
    binding: Mutex<Vec<ThreadId>>,
}

impl PointCut {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MalformedPointcut`] when the pattern cannot be parsed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use wirebox::aspect::PointCut;
    ///
    /// let pointcut = PointCut::parse("public void pkg.Type.angry(..)")?;
    /// assert!(!pointcut.is_whole_type());
    /// assert!(PointCut::parse("pkg.TypeB")?.is_whole_type());
    /// # Ok::<(), wirebox::core::WireError>(())
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, WireError> {
        let malformed = |reason: &str| WireError::MalformedPointcut {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(malformed("empty pattern"));
        }

        let matcher = match trimmed.find('(') {
            None => {
                if trimmed.split_whitespace().count() != 1 {
                    return Err(malformed("a type pattern is a single word"));
                }
                Matcher::WholeType(compile(trimmed).map_err(|e| malformed(&e))?)
            }
            Some(open) => {
                let executable = parse_executable(&trimmed[..open], &trimmed[open..])
                    .map_err(|e| malformed(&e))?;
                Matcher::Executable(Box::new(executable))
            }
        };

        Ok(Self {
            pattern: trimmed.to_string(),
            matcher,
            handler: None,
            handler_builder: None,
            handler_type: None,
            bound: OnceLock::new(),
            binding: Mutex::new(Vec::new()),
        })
    }

    /// Bind a handler directly. Takes priority over every other binding.
    pub fn with_handler(mut self, handler: HandlerRef) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind the product of a builder as handler.
    pub fn with_handler_builder(mut self, name: impl Into<String>) -> Self {
        self.handler_builder = Some(name.into());
        self
    }

    /// Bind a fresh instance of a handler type.
    pub fn with_handler_type(mut self, type_name: impl Into<String>) -> Self {
        self.handler_type = Some(type_name.into());
        self
    }

    /// The builder whose product handles matched calls.
    pub fn handler_builder(&self) -> Option<&str> {
        self.handler_builder.as_deref()
    }

    /// The pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether this is a bare type pattern.
    pub fn is_whole_type(&self) -> bool {
        matches!(self.matcher, Matcher::WholeType(_))
    }

    /// Whether a whole-type pattern matches `type_name`.
    pub fn matches_type(&self, type_name: &str) -> bool {
        match &self.matcher {
            Matcher::WholeType(regex) => regex.is_match(type_name),
            Matcher::Executable(_) => false,
        }
    }

    /// Whether an executable pattern matches `executable`, considered as part of
    /// a builder producing `builder_type`.
    pub fn matches(&self, executable: &Executable, builder_type: &str) -> bool {
        let Matcher::Executable(pattern) = &self.matcher else {
            return false;
        };

        if !pattern.modifiers.is_empty() && !pattern.modifiers.matched_by(executable.modifiers()) {
            return false;
        }
        if !pattern.method.is_match(executable.name()) {
            return false;
        }
        if !pattern.target_type.is_match(executable.declaring_type())
            && !pattern.target_type.is_match(builder_type)
        {
            return false;
        }
        if !pattern.return_type.is_match(&executable.return_type().to_string()) {
            return false;
        }
        match &pattern.params {
            None => true,
            Some(params) => {
                params.len() == executable.params().len()
                    && params
                        .iter()
                        .zip(executable.params())
                        .all(|(regex, param)| regex.is_match(&param.to_string()))
            }
        }
    }

    /// The handler for matched calls.
    ///
    /// Resolved on first use and memoized: the direct handler, then the named
    /// builder, then a new instance of the handler type, then [`Passthrough`].
    ///
    /// Binding runs outside the memo cell. A thread that asks for the handler
    /// while it is already binding it (a handler builder matched by its own
    /// pointcut) gets an unmemoized [`Passthrough`]. Threads racing to bind
    /// each compute a handler and the first one stored wins.
    pub fn handler(&self, context: &Context) -> HandlerRef {
        if let Some(handler) = self.bound.get() {
            return Arc::clone(handler);
        }
        let Some(_guard) = self.enter_binding() else {
            debug!("Pointcut '{}' re-entered while binding, passing through", self.pattern);
            return Arc::new(Passthrough);
        };
        let handler = self.bind(context);
        Arc::clone(self.bound.get_or_init(|| handler))
    }

    fn enter_binding(&self) -> Option<BindingGuard<'_>> {
        let thread = thread::current().id();
        let mut binding = self.binding.lock();
        if binding.contains(&thread) {
            return None;
        }
        binding.push(thread);
        Some(BindingGuard {
            pointcut: self,
            thread,
        })
    }

    fn bind(&self, context: &Context) -> HandlerRef {
        if let Some(handler) = &self.handler {
            return Arc::clone(handler);
        }

        if let Some(name) = &self.handler_builder {
            match context.try_build(name) {
                Ok(Some(value)) => match handler_from_value(&value) {
                    Some(handler) => return handler,
                    None => warn!(
                        "Builder '{}' bound to pointcut '{}' does not produce a handler",
                        name, self.pattern
                    ),
                },
                Ok(None) => debug!("Handler builder '{}' for '{}' not found", name, self.pattern),
                Err(e) => warn!("Failed to build handler '{}' for '{}': {}", name, self.pattern, e),
            }
        }

        if let Some(type_name) = &self.handler_type {
            match context.instantiate(type_name) {
                Ok(value) => match handler_from_value(&value) {
                    Some(handler) => return handler,
                    None => warn!(
                        "Type '{}' bound to pointcut '{}' is not a handler",
                        type_name, self.pattern
                    ),
                },
                Err(e) => warn!(
                    "Failed to instantiate handler '{}' for '{}': {}",
                    type_name, self.pattern, e
                ),
            }
        }

        debug!("Pointcut '{}' falls back to passthrough", self.pattern);
        Arc::new(Passthrough)
    }
}

/// Clears the binding mark of the current thread when dropped.
struct BindingGuard<'a> {
    pointcut: &'a PointCut,
    thread: ThreadId,
}

impl Drop for BindingGuard<'_> {
    fn drop(&mut self) {
        self.pointcut.binding.lock().retain(|thread| *thread != self.thread);
    }
}

impl fmt::Debug for PointCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointCut")
            .field("pattern", &self.pattern)
            .field("handler", &self.handler.is_some())
            .field("handler_builder", &self.handler_builder)
            .field("handler_type", &self.handler_type)
            .field("bound", &self.bound.get().is_some())
            .finish()
    }
}

impl fmt::Display for PointCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

fn parse_executable(head: &str, args: &str) -> Result<ExecutablePattern, String> {
    let inner = args
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or("argument list must end with ')'")?;

    let mut words: Vec<&str> = head.split_whitespace().collect();
    let qualified = words.pop().ok_or("missing Type.method")?;
    let (type_part, method_part) = qualified
        .rsplit_once('.')
        .ok_or("expected Type.method before the argument list")?;
    if type_part.is_empty() || method_part.is_empty() {
        return Err("expected Type.method before the argument list".to_string());
    }

    let mut modifiers = Modifiers::empty();
    let mut return_type = None;
    for word in words {
        if return_type.is_some() {
            return Err(format!("unexpected '{word}' after the return type"));
        }
        match Modifiers::from_keyword(word) {
            Some(flag) => modifiers |= flag,
            None => return_type = Some(word),
        }
    }

    let params = match inner.trim() {
        ".." => None,
        "" => Some(Vec::new()),
        list => Some(
            split_args(list)?
                .into_iter()
                .map(|arg| {
                    if arg == ".." {
                        return Err("'..' must be the only argument pattern".to_string());
                    }
                    compile(arg)
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    Ok(ExecutablePattern {
        modifiers,
        return_type: compile(return_type.unwrap_or("*"))?,
        target_type: compile(type_part)?,
        method: compile(method_part)?,
        params,
    })
}

/// Split an argument list at top-level commas, keeping `map<a,b>` together.
fn split_args(list: &str) -> Result<Vec<&str>, String> {
    let mut depth = 0i32;
    let mut start = 0;
    let mut parts = Vec::new();
    for (i, c) in list.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            return Err("unbalanced '>' in argument list".to_string());
        }
    }
    if depth != 0 {
        return Err("unbalanced '<' in argument list".to_string());
    }
    parts.push(list[start..].trim());
    if parts.iter().any(|part| part.is_empty()) {
        return Err("empty argument pattern".to_string());
    }
    Ok(parts)
}

/// Compile a wildcard pattern into an anchored regex. A lone `*` matches anything.
fn compile(pattern: &str) -> Result<Regex, String> {
    if pattern.is_empty() {
        return Err("empty name pattern".to_string());
    }
    if pattern == "*" {
        return Regex::new("^.*$").map_err(|e| e.to_string());
    }
    let body = pattern.split('*').map(regex::escape).collect::<Vec<_>>().join("[^.]*");
    Regex::new(&format!("^{body}$")).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{ClassDescriptor, TypeRegistry};
    use crate::value::{Object, Value};

    fn registry() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types
            .register(
                ClassDescriptor::builder("pkg.Type")
                    .constructor(&["string"], |_| Ok(Object::new("pkg.Type").into()))
                    .method("angry", &[], "void", |_, _| Ok(Value::Null))
                    .method("angryNow", &[], "void", |_, _| Ok(Value::Null))
                    .method_with(Modifiers::PRIVATE, "angry", &["int"], "void", |_, _| {
                        Ok(Value::Null)
                    })
                    .method("render", &["map<string,int>", "list<int>"], "string", |_, _| {
                        Ok(Value::from(""))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        types
    }

    fn find(types: &TypeRegistry, signature: &str) -> std::sync::Arc<Executable> {
        types
            .constructors("pkg.Type")
            .into_iter()
            .chain(types.methods("pkg.Type"))
            .find(|e| e.signature() == signature)
            .unwrap()
    }

    #[test]
    fn test_public_void_angry_any_args() {
        let types = registry();
        let pointcut = PointCut::parse("public void pkg.Type.angry(..)").unwrap();
        assert!(pointcut.matches(&find(&types, "pkg.Type.angry()"), "pkg.Type"));
        assert!(!pointcut.matches(&find(&types, "pkg.Type.angryNow()"), "pkg.Type"));
        assert!(!pointcut.matches(&find(&types, "pkg.Type.angry(int)"), "pkg.Type"));
    }

    #[test]
    fn test_wildcards_and_constructor_token() {
        let types = registry();
        let ctor = find(&types, "pkg.Type.new(string)");
        assert!(PointCut::parse("pkg.*.new(string)").unwrap().matches(&ctor, "pkg.Type"));
        assert!(PointCut::parse("* *.Type.new(..)").unwrap().matches(&ctor, "pkg.Type"));
        assert!(!PointCut::parse("pkg.Type.new()").unwrap().matches(&ctor, "pkg.Type"));
        assert!(!PointCut::parse("other.*.new(string)").unwrap().matches(&ctor, "pkg.Type"));
    }

    #[test]
    fn test_generic_argument_patterns() {
        let types = registry();
        let render = find(&types, "pkg.Type.render(map<string,int>,list<int>)");
        let pointcut = PointCut::parse("string pkg.Type.render(map<string,*>, list<*>)").unwrap();
        assert!(pointcut.matches(&render, "pkg.Type"));
    }

    #[test]
    fn test_builder_type_matches_inherited_method() {
        let types = registry();
        let angry = find(&types, "pkg.Type.angry()");
        let pointcut = PointCut::parse("pkg.Sub.angry()").unwrap();
        assert!(pointcut.matches(&angry, "pkg.Sub"));
        assert!(!pointcut.matches(&angry, "pkg.Other"));
    }

    #[test]
    fn test_whole_type() {
        let pointcut = PointCut::parse("pkg.TypeB").unwrap();
        assert!(pointcut.is_whole_type());
        assert!(pointcut.matches_type("pkg.TypeB"));
        assert!(!pointcut.matches_type("pkg.TypeBee"));
        assert!(PointCut::parse("pkg.*").unwrap().matches_type("pkg.TypeB"));
        assert!(!PointCut::parse("pkg.*").unwrap().matches_type("pkg.sub.TypeB"));
    }

    #[test]
    fn test_malformed_patterns() {
        for pattern in [
            "",
            "pkg.Type.angry(",
            "angry()",
            "public void extra pkg.Type.angry()",
            "pkg.Type.angry(.., int)",
            "pkg.Type.angry(int,)",
            "pkg.Type angry",
        ] {
            assert!(
                matches!(PointCut::parse(pattern), Err(WireError::MalformedPointcut { .. })),
                "{pattern} should be rejected"
            );
        }
    }
}
