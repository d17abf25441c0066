//! A minimal hand-rolled recursive-descent parser from Helm-style
//! template source text into `helm2tl::ast::Node` (SPEC_FULL.md §4.11,
//! §11: "the CLI ships one minimal hand-rolled recursive-descent parser
//! sufficient for the node taxonomy in spec.md §6").
//!
//! This is deliberately not a complete Go `text/template` grammar: it
//! covers the constructs the node taxonomy actually names (`if`/`else
//! if`/`else`, `with`, `range`, `template`, `define`, pipelines, variable
//! declarations/reassignment, field/variable chains, literals) and skips
//! rarer corners (`block`, chained field access off a parenthesized
//! sub-pipeline) that don't have a node shape of their own to produce.
//! The library crate never depends on this module; it exists solely so
//! `helm2tl-cli` is runnable against real chart directories.

use std::fmt;

use helm2tl::ast::{Arg, Command, Node, NumberLit, Pipe, Variable};
use helm2tl::loader::ParsedFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

fn err(message: impl Into<String>) -> ParseError {
    ParseError { message: message.into() }
}

pub fn parse_template(source: &str) -> Result<ParsedFile, ParseError> {
    let pieces = tokenize_pieces(source);
    let mut defines = Vec::new();
    // Top-level `end`/`else` are never in the stop set, so an unmatched
    // one is caught by parse_block's own "no open block" error instead of
    // ever reaching here as a StopKind::End/Else.
    let result = parse_block(&pieces, 0, &[], &mut defines)?;
    Ok(ParsedFile { root: nodes_to_node(result.nodes), defines })
}

// --- Stage 1: split source into alternating text/action pieces, honoring
// `{{-`/`-}}` whitespace-trim markers and `{{/* ... */}}` comments
// (dropped entirely, matching Go's own lexer: a comment leaves no node).

#[derive(Debug, Clone)]
enum Piece {
    Text(Vec<u8>),
    Action(String),
}

fn tokenize_pieces(source: &str) -> Vec<Piece> {
    let bytes = source.as_bytes();
    let mut pieces = Vec::new();
    let mut pos = 0;
    let mut pending_trim_left = false;

    while pos < bytes.len() {
        let Some(open) = find(bytes, pos, b"{{") else {
            push_text(&mut pieces, &bytes[pos..], pending_trim_left, false);
            break;
        };
        let mut action_start = open + 2;
        let trim_left_marker = bytes.get(action_start) == Some(&b'-');
        if trim_left_marker {
            action_start += 1;
        }

        let is_comment = bytes[action_start..].starts_with(b"/*");
        if is_comment {
            let Some(close_comment) = find(bytes, action_start + 2, b"*/") else {
                push_text(&mut pieces, &bytes[pos..open], pending_trim_left, trim_left_marker);
                break;
            };
            let mut after = close_comment + 2;
            let trim_right_marker = bytes[after..].starts_with(b"-}}");
            let close_len = if trim_right_marker { 3 } else { 2 };
            after += close_len;
            push_text(&mut pieces, &bytes[pos..open], pending_trim_left, trim_left_marker);
            pending_trim_left = trim_right_marker;
            pos = after;
            continue;
        }

        let Some((close, trim_right_marker)) = find_action_close(bytes, action_start) else {
            push_text(&mut pieces, &bytes[pos..open], pending_trim_left, trim_left_marker);
            break;
        };
        let mut content_end = close;
        if trim_right_marker {
            content_end -= 1;
        }
        let content = std::str::from_utf8(&bytes[action_start..content_end]).unwrap_or("").trim().to_owned();

        push_text(&mut pieces, &bytes[pos..open], pending_trim_left, trim_left_marker);
        pieces.push(Piece::Action(content));
        pending_trim_left = trim_right_marker;
        pos = close + 2;
    }
    pieces
}

fn push_text(pieces: &mut Vec<Piece>, text: &[u8], trim_start: bool, trim_end: bool) {
    let mut s = text;
    if trim_start {
        s = trim_ascii_whitespace_start(s);
    }
    if trim_end {
        s = trim_ascii_whitespace_end(s);
    }
    if !s.is_empty() {
        pieces.push(Piece::Text(s.to_vec()));
    }
}

fn trim_ascii_whitespace_start(mut s: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = s {
        if first.is_ascii_whitespace() {
            s = rest;
        } else {
            break;
        }
    }
    s
}

fn trim_ascii_whitespace_end(mut s: &[u8]) -> &[u8] {
    while let [rest @ .., last] = s {
        if last.is_ascii_whitespace() {
            s = rest;
        } else {
            break;
        }
    }
    s
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack[from..].windows(needle.len()).position(|w| w == needle).map(|i| from + i)
}

/// Finds the `}}` (or `-}}`) that closes an action, skipping over
/// double-quoted string literals so a literal `}}` inside a string
/// doesn't terminate the action early.
fn find_action_close(bytes: &[u8], from: usize) -> Option<(usize, bool)> {
    let mut i = from;
    let mut in_string = false;
    while i + 1 < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        if b == b'-' && bytes[i + 1] == b'}' && bytes.get(i + 2) == Some(&b'}') {
            return Some((i + 1, true));
        }
        if b == b'}' && bytes[i + 1] == b'}' {
            return Some((i, false));
        }
        i += 1;
    }
    None
}

// --- Stage 2: recursive-descent over the piece list, building Nodes. ---
//
// Each parse function takes a starting piece index and returns both its
// result and the index of the next unconsumed piece, so the caller never
// has to recover position information after the fact.

#[derive(PartialEq, Eq)]
enum StopKind {
    End,
    Else,
    EndOfInput,
}

struct BlockResult {
    nodes: Vec<Node>,
    stop: StopKind,
    /// Index of the piece right after the stop action (`{{end}}`/
    /// `{{else...}}`), or `pieces.len()` on `StopKind::EndOfInput`.
    next: usize,
}

/// Parses pieces starting at `pos` until an `end` or `else` action is hit
/// (whichever is in `stop_words`) or input is exhausted. Named
/// `{{define}}` blocks encountered anywhere are appended to `defines`
/// rather than the returned node list.
fn parse_block(
    pieces: &[Piece],
    mut pos: usize,
    stop_words: &[&str],
    defines: &mut Vec<(String, Node)>,
) -> Result<BlockResult, ParseError> {
    let mut nodes = Vec::new();
    while pos < pieces.len() {
        match &pieces[pos] {
            Piece::Text(bytes) => {
                nodes.push(Node::Text(bytes.clone()));
                pos += 1;
            }
            Piece::Action(content) => {
                let (keyword, rest) = split_keyword(content);
                if stop_words.contains(&keyword) {
                    let stop = if keyword == "end" { StopKind::End } else { StopKind::Else };
                    return Ok(BlockResult { nodes, stop, next: pos });
                }
                match keyword {
                    "if" => {
                        let (node, next) = parse_if(pieces, pos + 1, rest, defines)?;
                        nodes.push(node);
                        pos = next;
                    }
                    "with" => {
                        let (node, next) = parse_with_or_range(pieces, pos + 1, rest, defines, false)?;
                        nodes.push(node);
                        pos = next;
                    }
                    "range" => {
                        let (node, next) = parse_with_or_range(pieces, pos + 1, rest, defines, true)?;
                        nodes.push(node);
                        pos = next;
                    }
                    "define" => {
                        let name = parse_quoted_name(rest)?;
                        let body_result = parse_block(pieces, pos + 1, &["end"], defines)?;
                        if body_result.stop != StopKind::End {
                            return Err(err(format!("missing {{{{end}}}} for define {name:?}")));
                        }
                        defines.push((name, nodes_to_node(body_result.nodes)));
                        pos = body_result.next + 1;
                    }
                    "template" => {
                        let (name, pipe) = parse_template_invocation(rest)?;
                        nodes.push(Node::Template(name, pipe));
                        pos += 1;
                    }
                    "end" | "else" => {
                        return Err(err(format!("unexpected {{{{{keyword}}}}} with no open block")));
                    }
                    _ => {
                        let pipe = parse_pipe(content)?;
                        nodes.push(Node::Action(pipe));
                        pos += 1;
                    }
                }
            }
        }
    }
    Ok(BlockResult { nodes, stop: StopKind::EndOfInput, next: pieces.len() })
}

fn parse_if(
    pieces: &[Piece],
    pos: usize,
    cond_src: &str,
    defines: &mut Vec<(String, Node)>,
) -> Result<(Node, usize), ParseError> {
    let cond = parse_pipe(cond_src)?;
    let then_result = parse_block(pieces, pos, &["else", "end"], defines)?;
    let then_node = nodes_to_node(then_result.nodes);
    match then_result.stop {
        StopKind::End => Ok((Node::If(cond, Box::new(then_node), None), then_result.next + 1)),
        StopKind::Else => {
            let Piece::Action(else_content) = &pieces[then_result.next] else { unreachable!("Else stop is always an Action") };
            let (_, else_rest) = split_keyword(else_content);
            if split_keyword(else_rest).0 == "if" {
                let (_, chained_rest) = split_keyword(else_rest);
                let (nested, next) = parse_if(pieces, then_result.next + 1, chained_rest, defines)?;
                Ok((Node::If(cond, Box::new(then_node), Some(Box::new(nested))), next))
            } else {
                let else_result = parse_block(pieces, then_result.next + 1, &["end"], defines)?;
                if else_result.stop != StopKind::End {
                    return Err(err("missing {{end}} for if/else"));
                }
                let else_node = nodes_to_node(else_result.nodes);
                Ok((Node::If(cond, Box::new(then_node), Some(Box::new(else_node))), else_result.next + 1))
            }
        }
        StopKind::EndOfInput => Err(err("missing {{end}} for if")),
    }
}

fn parse_with_or_range(
    pieces: &[Piece],
    pos: usize,
    pipe_src: &str,
    defines: &mut Vec<(String, Node)>,
    is_range: bool,
) -> Result<(Node, usize), ParseError> {
    let pipe = parse_pipe(pipe_src)?;
    if is_range && pipe.declarations.len() > 2 {
        return Err(err(format!("range supports at most 2 declarations, got {}", pipe.declarations.len())));
    }
    let body_result = parse_block(pieces, pos, &["else", "end"], defines)?;
    let body_node = nodes_to_node(body_result.nodes);
    let (else_node, next) = match body_result.stop {
        StopKind::End => (None, body_result.next + 1),
        StopKind::Else => {
            let else_result = parse_block(pieces, body_result.next + 1, &["end"], defines)?;
            if else_result.stop != StopKind::End {
                return Err(err("missing {{end}} for with/range else"));
            }
            (Some(Box::new(nodes_to_node(else_result.nodes))), else_result.next + 1)
        }
        StopKind::EndOfInput => return Err(err("missing {{end}}")),
    };
    let node = if is_range {
        Node::Range(pipe, Box::new(body_node), else_node)
    } else {
        Node::With(pipe, Box::new(body_node), else_node)
    };
    Ok((node, next))
}

fn nodes_to_node(mut nodes: Vec<Node>) -> Node {
    match nodes.len() {
        0 => Node::Text(Vec::new()),
        1 => nodes.pop().expect("len checked"),
        _ => Node::List(nodes),
    }
}

fn split_keyword(content: &str) -> (&str, &str) {
    match content.find(char::is_whitespace) {
        Some(i) => (&content[..i], content[i..].trim_start()),
        None => (content, ""),
    }
}

fn parse_quoted_name(content: &str) -> Result<String, ParseError> {
    let tokens = tokenize_pipeline(content)?;
    match tokens.first() {
        Some(PToken::Str(s)) => Ok(s.clone()),
        _ => Err(err(format!("expected a quoted template name, got: {content}"))),
    }
}

fn parse_template_invocation(content: &str) -> Result<(String, Pipe), ParseError> {
    let tokens = tokenize_pipeline(content)?;
    let (name, rest) = match tokens.split_first() {
        Some((PToken::Str(s), rest)) => (s.clone(), rest),
        _ => return Err(err(format!("expected a quoted template name, got: {content}"))),
    };
    let pipe = if rest.is_empty() {
        Pipe { declarations: Vec::new(), is_assign: false, commands: vec![vec![Arg::Nil]] }
    } else {
        parse_full_pipe(rest)?
    };
    Ok((name, pipe))
}

// --- Pipeline expression tokenizer + parser. ---

#[derive(Debug, Clone, PartialEq)]
enum PToken {
    Word(String),
    Str(String),
    Pipe,
    Comma,
    ColonEq,
    Eq,
    LParen,
    RParen,
}

fn tokenize_pipeline(content: &str) -> Result<Vec<PToken>, ParseError> {
    let bytes = content.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        match b {
            b'|' => {
                tokens.push(PToken::Pipe);
                i += 1;
            }
            b',' => {
                tokens.push(PToken::Comma);
                i += 1;
            }
            b'(' => {
                tokens.push(PToken::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(PToken::RParen);
                i += 1;
            }
            b':' if bytes.get(i + 1) == Some(&b'=') => {
                tokens.push(PToken::ColonEq);
                i += 2;
            }
            b'=' => {
                tokens.push(PToken::Eq);
                i += 1;
            }
            b'"' => {
                let (s, next) = read_string_literal(bytes, i + 1)?;
                tokens.push(PToken::Str(s));
                i = next;
            }
            _ => {
                let start = i;
                while i < bytes.len() && !matches!(bytes[i], b'|' | b',' | b'(' | b')' | b'"') && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                let word = std::str::from_utf8(&bytes[start..i]).unwrap_or("").to_owned();
                tokens.push(PToken::Word(word));
            }
        }
    }
    Ok(tokens)
}

fn read_string_literal(bytes: &[u8], mut i: usize) -> Result<(String, usize), ParseError> {
    let mut out = String::new();
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Ok((out, i + 1)),
            b'\\' if i + 1 < bytes.len() => {
                let escaped = match bytes[i + 1] {
                    b'n' => '\n',
                    b'r' => '\r',
                    b't' => '\t',
                    b'"' => '"',
                    b'\\' => '\\',
                    other => other as char,
                };
                out.push(escaped);
                i += 2;
            }
            b => {
                out.push(b as char);
                i += 1;
            }
        }
    }
    Err(err("unterminated string literal"))
}

fn parse_pipe(content: &str) -> Result<Pipe, ParseError> {
    let tokens = tokenize_pipeline(content)?;
    parse_full_pipe(&tokens)
}

fn parse_full_pipe(tokens: &[PToken]) -> Result<Pipe, ParseError> {
    let (declarations, is_assign, rest) = split_declarations(tokens);
    if rest.is_empty() {
        return Err(err("empty pipeline"));
    }
    let commands = split_top_level(rest, &PToken::Pipe)
        .into_iter()
        .map(parse_command)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Pipe { declarations, is_assign, commands })
}

/// Detects a leading `$a[, $b] (:=|=)` declaration prefix. Returns the
/// declared names, whether the operator was `=` (assignment) rather than
/// `:=` (definition), and the remaining tokens.
fn split_declarations(tokens: &[PToken]) -> (Vec<Variable>, bool, &[PToken]) {
    let mut names = Vec::new();
    let mut i = 0;
    loop {
        match tokens.get(i) {
            Some(PToken::Word(w)) if w.starts_with('$') && w.len() > 1 => {
                names.push(Variable(w[1..].to_owned()));
                i += 1;
            }
            _ => return (Vec::new(), false, tokens),
        }
        match tokens.get(i) {
            Some(PToken::Comma) => {
                i += 1;
                continue;
            }
            Some(PToken::ColonEq) => return (names, false, &tokens[i + 1..]),
            Some(PToken::Eq) => return (names, true, &tokens[i + 1..]),
            _ => return (Vec::new(), false, tokens),
        }
    }
}

/// Splits `tokens` on `sep` at paren-nesting depth 0.
fn split_top_level<'a>(tokens: &'a [PToken], sep: &PToken) -> Vec<&'a [PToken]> {
    let mut segments = Vec::new();
    let mut depth = 0;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        match tok {
            PToken::LParen => depth += 1,
            PToken::RParen => depth -= 1,
            t if depth == 0 && t == sep => {
                segments.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&tokens[start..]);
    segments
}

fn parse_command(tokens: &[PToken]) -> Result<Command, ParseError> {
    let mut args = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            PToken::LParen => {
                let close = matching_rparen(tokens, i)?;
                let inner = &tokens[i + 1..close];
                let sub_pipe = parse_full_pipe(inner)?;
                args.push(Arg::Pipe(Box::new(sub_pipe)));
                i = close + 1;
            }
            PToken::Str(s) => {
                args.push(Arg::String(s.clone()));
                i += 1;
            }
            PToken::Word(w) => {
                args.push(classify_word(w)?);
                i += 1;
            }
            other => return Err(err(format!("unexpected token in command: {other:?}"))),
        }
    }
    if args.is_empty() {
        return Err(err("empty command"));
    }
    Ok(args)
}

fn matching_rparen(tokens: &[PToken], open: usize) -> Result<usize, ParseError> {
    let mut depth = 0;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok {
            PToken::LParen => depth += 1,
            PToken::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(err("unmatched ( in pipeline"))
}

fn classify_word(w: &str) -> Result<Arg, ParseError> {
    if w == "nil" {
        return Ok(Arg::Nil);
    }
    if w == "true" {
        return Ok(Arg::Bool(true));
    }
    if w == "false" {
        return Ok(Arg::Bool(false));
    }
    if w == "." {
        return Ok(Arg::Dot);
    }
    if let Some(rest) = w.strip_prefix('.') {
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(Arg::Field(rest.split('.').map(str::to_owned).collect()));
        }
    }
    if let Some(rest) = w.strip_prefix('$') {
        let mut parts = rest.split('.');
        let name = parts.next().unwrap_or("").to_owned();
        let subpath: Vec<String> = parts.map(str::to_owned).collect();
        let mut idents = vec![name];
        idents.extend(subpath);
        return Ok(Arg::Variable(idents));
    }
    let starts_numeric = w.starts_with(|c: char| c.is_ascii_digit())
        || (w.starts_with('-') && w.len() > 1 && w.as_bytes()[1].is_ascii_digit());
    if starts_numeric {
        return classify_number(w);
    }
    Ok(Arg::Identifier(w.to_owned()))
}

fn classify_number(w: &str) -> Result<Arg, ParseError> {
    let is_float = w.contains('.') || w.contains('e') || w.contains('E');
    if is_float {
        let f: f64 = w.parse().map_err(|_| err(format!("invalid number literal: {w}")))?;
        Ok(Arg::Number(NumberLit { is_int: false, is_uint: false, is_float: true, is_complex: false, int64: 0, float64: f, text: w.to_owned() }))
    } else {
        let i: i64 = w.parse().map_err(|_| err(format!("invalid number literal: {w}")))?;
        Ok(Arg::Number(NumberLit { is_int: true, is_uint: false, is_float: false, is_complex: false, int64: i, float64: 0.0, text: w.to_owned() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_no_actions() {
        let parsed = parse_template("hello world").unwrap();
        match parsed.root {
            Node::Text(b) => assert_eq!(b, b"hello world"),
            other => panic!("expected Text, got {other:?}"),
        }
    }

    #[test]
    fn simple_field_action() {
        let parsed = parse_template("{{ .Values.name }}").unwrap();
        match parsed.root {
            Node::Action(pipe) => {
                assert_eq!(pipe.commands.len(), 1);
                assert_eq!(pipe.commands[0].len(), 1);
                match &pipe.commands[0][0] {
                    Arg::Field(segments) => assert_eq!(segments.as_slice(), ["Values", "name"]),
                    other => panic!("expected Field, got {other:?}"),
                }
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn pipeline_with_builtin_call() {
        let parsed = parse_template(r#"{{ .Values.name | upper | quote }}"#).unwrap();
        let Node::Action(pipe) = parsed.root else { panic!("expected action") };
        assert_eq!(pipe.commands.len(), 3);
        match &pipe.commands[1][0] {
            Arg::Identifier(name) => assert_eq!(name, "upper"),
            other => panic!("expected Identifier, got {other:?}"),
        }
    }

    #[test]
    fn if_else_round_trips_to_if_node() {
        let parsed = parse_template("{{if .Values.enabled}}yes{{else}}no{{end}}").unwrap();
        match parsed.root {
            Node::If(_, then_node, Some(else_node)) => {
                assert!(matches!(*then_node, Node::Text(ref b) if b == b"yes"));
                assert!(matches!(*else_node, Node::Text(ref b) if b == b"no"));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn else_if_chains_into_nested_if() {
        let parsed = parse_template("{{if eq 1 2}}a{{else if eq 2 2}}b{{else}}c{{end}}").unwrap();
        let Node::If(_, _, Some(else_node)) = parsed.root else { panic!("expected outer if") };
        assert!(matches!(*else_node, Node::If(..)));
    }

    #[test]
    fn range_with_index_and_value_decls() {
        let parsed = parse_template("{{range $i, $v := .Items}}{{$i}}{{end}}").unwrap();
        match parsed.root {
            Node::Range(pipe, _, None) => {
                assert_eq!(pipe.declarations.len(), 2);
                assert_eq!(pipe.declarations[0].0, "i");
                assert_eq!(pipe.declarations[1].0, "v");
            }
            other => panic!("expected Range, got {other:?}"),
        }
    }

    #[test]
    fn variable_declaration_and_reassignment() {
        let parsed = parse_template("{{$x := 2}}").unwrap();
        let Node::Action(pipe) = parsed.root else { panic!("expected action") };
        assert!(!pipe.is_assign);
        assert_eq!(pipe.declarations[0].0, "x");

        let parsed = parse_template("{{$x = 3}}").unwrap();
        let Node::Action(pipe) = parsed.root else { panic!("expected action") };
        assert!(pipe.is_assign);
    }

    #[test]
    fn define_block_is_collected_separately() {
        let parsed = parse_template(r#"{{define "helpers.name"}}release{{end}}"#).unwrap();
        assert_eq!(parsed.defines.len(), 1);
        assert_eq!(parsed.defines[0].0, "helpers.name");
        assert!(matches!(parsed.root, Node::Text(ref b) if b.is_empty()));
    }

    #[test]
    fn template_invocation_parses_name_and_pipeline() {
        let parsed = parse_template(r#"{{template "helpers.name" .}}"#).unwrap();
        match parsed.root {
            Node::Template(name, pipe) => {
                assert_eq!(name, "helpers.name");
                assert!(matches!(pipe.commands[0][0], Arg::Dot));
            }
            other => panic!("expected Template, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_trim_markers_strip_adjacent_text() {
        let parsed = parse_template("a \n  {{- .X -}}  \n b").unwrap();
        match parsed.root {
            Node::List(nodes) => {
                assert!(matches!(&nodes[0], Node::Text(b) if b == b"a"));
                assert!(matches!(&nodes[2], Node::Text(b) if b == b"b"));
            }
            other => panic!("expected List, got {other:?}"),
        }
    }

    #[test]
    fn comments_produce_no_node() {
        let parsed = parse_template("a{{/* a comment */}}b").unwrap();
        match parsed.root {
            Node::List(nodes) => assert_eq!(nodes.len(), 2),
            other => panic!("expected List of two text nodes, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_sub_pipeline_compiles_as_arg_pipe() {
        let parsed = parse_template(r#"{{if and (eq 1 1) (eq 2 2)}}x{{end}}"#).unwrap();
        let Node::If(cond, ..) = parsed.root else { panic!("expected if") };
        match &cond.commands[0][0] {
            Arg::Identifier(name) => assert_eq!(name, "and"),
            other => panic!("expected Identifier, got {other:?}"),
        }
        assert!(matches!(cond.commands[0][1], Arg::Pipe(_)));
    }
}
