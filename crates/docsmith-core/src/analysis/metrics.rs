//! Code Metrics Calculation
//!
//! Line metrics come from a lexical scan of the raw text; complexity and
//! nesting are accumulated by [`ComplexityTracker`] while the structural
//! extractor walks the syntax tree, so the tree is only traversed once.

use docsmith_shared::MaintainabilityWeights;

/// Line-based metrics of a source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineMetrics {
    pub total_lines: usize,
    /// Lines holding anything other than whitespace and comments
    pub code_lines: usize,
    /// Lines holding any comment text, including lines inside block comments
    pub comment_lines: usize,
}

impl LineMetrics {
    /// Commented lines over total lines, 0 for an empty file
    pub fn comment_ratio(&self) -> f64 {
        if self.total_lines == 0 {
            return 0.0;
        }
        (self.comment_lines as f64 / self.total_lines as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LexState {
    #[default]
    Code,
    BlockComment,
    Quoted(char),
    Template,
    Regex { in_class: bool },
}

/// What one scanned line contained
#[derive(Debug, Clone, Copy, Default)]
struct LineKind {
    has_code: bool,
    has_comment: bool,
}

/// Code handed to a scan callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Char(char),
    /// Opening of a string, template or regex literal
    Literal,
}

/// Words after which `/` opens a regex literal rather than dividing
const REGEX_PREFIX_KEYWORDS: [&str; 14] = [
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Minimal JavaScript lexer: tells comments apart from code and skips
/// string, template and regex literal contents.
#[derive(Debug, Default)]
struct SourceScanner {
    state: LexState,
    /// The last code token ends an operand, so `/` divides
    after_operand: bool,
    word: String,
    in_word: bool,
}

impl SourceScanner {
    /// Scan one line (without its terminator). `on_code` receives every
    /// non-whitespace code character, and one [`Lexeme::Literal`] per literal.
    fn scan_line(&mut self, line: &str, mut on_code: impl FnMut(Lexeme)) -> LineKind {
        let mut kind = LineKind {
            has_code: false,
            has_comment: self.state == LexState::BlockComment,
        };
        let mut chars = line.chars().peekable();
        self.in_word = false;

        while let Some(c) = chars.next() {
            match self.state {
                LexState::BlockComment => {
                    kind.has_comment = true;
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        self.state = LexState::Code;
                    }
                }
                LexState::Quoted(quote) => {
                    kind.has_code = true;
                    if c == '\\' {
                        chars.next();
                    } else if c == quote {
                        self.close_literal();
                    }
                }
                LexState::Template => {
                    kind.has_code = true;
                    if c == '\\' {
                        chars.next();
                    } else if c == '`' {
                        self.close_literal();
                    }
                }
                LexState::Regex { in_class } => {
                    kind.has_code = true;
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '[' => self.state = LexState::Regex { in_class: true },
                        ']' => self.state = LexState::Regex { in_class: false },
                        '/' if !in_class => self.close_literal(),
                        _ => {}
                    }
                }
                LexState::Code => {
                    if c == '/' && chars.peek() == Some(&'/') {
                        kind.has_comment = true;
                        break;
                    }
                    if c == '/' && chars.peek() == Some(&'*') {
                        chars.next();
                        kind.has_comment = true;
                        self.state = LexState::BlockComment;
                        continue;
                    }
                    if c.is_whitespace() {
                        self.in_word = false;
                        continue;
                    }
                    kind.has_code = true;
                    match c {
                        '\'' | '"' => self.open_literal(LexState::Quoted(c), &mut on_code),
                        '`' => self.open_literal(LexState::Template, &mut on_code),
                        '/' if !self.after_operand => {
                            self.open_literal(LexState::Regex { in_class: false }, &mut on_code)
                        }
                        _ => {
                            self.note_code(c);
                            on_code(Lexeme::Char(c));
                        }
                    }
                }
            }
        }

        // Strings end at the line break unless continued with a backslash;
        // regex literals never span lines
        let open_string = matches!(self.state, LexState::Quoted(_)) && !line.ends_with('\\');
        if open_string || matches!(self.state, LexState::Regex { .. }) {
            self.close_literal();
        }

        kind
    }

    fn open_literal(&mut self, state: LexState, on_code: &mut impl FnMut(Lexeme)) {
        self.state = state;
        self.in_word = false;
        on_code(Lexeme::Literal);
    }

    fn close_literal(&mut self) {
        self.state = LexState::Code;
        self.after_operand = true;
    }

    fn note_code(&mut self, c: char) {
        if c.is_alphanumeric() || c == '_' || c == '$' {
            if !self.in_word {
                self.word.clear();
            }
            self.word.push(c);
            self.in_word = true;
            self.after_operand = !REGEX_PREFIX_KEYWORDS.contains(&self.word.as_str());
        } else {
            self.in_word = false;
            // `</` closes a JSX element
            self.after_operand = matches!(c, ')' | ']' | '}' | '<');
        }
    }
}

/// Count total, code and comment lines
pub fn scan_lines(source: &str) -> LineMetrics {
    let mut scanner = SourceScanner::default();
    let mut metrics = LineMetrics::default();

    for line in source.lines() {
        let kind = scanner.scan_line(line, |_| {});
        metrics.total_lines += 1;
        if kind.has_code {
            metrics.code_lines += 1;
        }
        if kind.has_comment {
            metrics.comment_lines += 1;
        }
    }

    metrics
}

/// First line on which bracket nesting exceeds `limit`, if any
pub fn bracket_overflow(source: &str, limit: usize) -> Option<usize> {
    let mut scanner = SourceScanner::default();
    let mut depth = 0usize;

    for (index, line) in source.lines().enumerate() {
        let mut exceeded = false;
        scanner.scan_line(line, |lexeme| match lexeme {
            Lexeme::Char('(' | '[' | '{') => {
                depth += 1;
                exceeded |= depth > limit;
            }
            Lexeme::Char(')' | ']' | '}') => depth = depth.saturating_sub(1),
            _ => {}
        });
        if exceeded {
            return Some(index + 1);
        }
    }

    None
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '&' | '|' | '^' | '?' | ':' | '.' | '!' | '~'
    )
}

/// First line on which one expression chains more than `limit` operators.
///
/// Operator chains nest the syntax tree as deeply as brackets do. A run of
/// adjacent operator characters counts once. The count restarts at `;`, `,`,
/// `{` and `}`, and at a line break unless an operator ends the line or
/// starts the next one.
pub fn operator_chain_overflow(source: &str, limit: usize) -> Option<usize> {
    let mut scanner = SourceScanner::default();
    let mut operators = 0usize;
    let mut in_operator = false;

    for (index, line) in source.lines().enumerate() {
        let mut exceeded = false;
        let mut line_start = true;
        scanner.scan_line(line, |lexeme| {
            match lexeme {
                Lexeme::Char(';' | ',' | '{' | '}') => {
                    operators = 0;
                    in_operator = false;
                }
                Lexeme::Char(c) if is_operator_char(c) => {
                    if !in_operator {
                        operators += 1;
                        exceeded |= operators > limit;
                    }
                    in_operator = true;
                }
                _ => {
                    if line_start && !in_operator {
                        operators = 0;
                    }
                    in_operator = false;
                }
            }
            line_start = false;
        });
        if exceeded {
            return Some(index + 1);
        }
    }

    None
}

/// Running cyclomatic complexity and nesting depth during a tree walk.
///
/// Every function starts at 1. Decisions outside any function are counted
/// at file level.
#[derive(Debug, Default)]
pub struct ComplexityTracker {
    frames: Vec<usize>,
    module_decisions: usize,
    functions_total: usize,
    depth: usize,
    max_depth: usize,
}

impl ComplexityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_function(&mut self) {
        self.frames.push(1);
        self.enter_block();
    }

    /// Close the innermost function and return its complexity
    pub fn exit_function(&mut self) -> usize {
        self.exit_block();
        let complexity = self.frames.pop().unwrap_or(1);
        self.functions_total += complexity;
        complexity
    }

    /// Record one decision point in the innermost function
    pub fn decision(&mut self) {
        match self.frames.last_mut() {
            Some(complexity) => *complexity += 1,
            None => self.module_decisions += 1,
        }
    }

    pub fn enter_block(&mut self) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    pub fn exit_block(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Sum of function complexities plus top-level decisions
    pub fn file_complexity(&self) -> usize {
        self.functions_total + self.module_decisions
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

const MI_BASE: f64 = 171.0;

/// Maintainability index in `(0, 100]`.
///
/// `100 * 171 / (171 + a*CC + b*ln(1 + LOC)) * (1 + w*sin(sqrt(2.4*c))) / (1 + w)`
///
/// Strictly decreasing in complexity and lines of code, strictly increasing
/// in comment ratio (`sqrt(2.4)` stays below `pi/2`, so the sine never turns).
/// Non-positive weights fall back to the defaults.
pub fn maintainability_index(
    complexity: usize,
    lines_of_code: usize,
    comment_ratio: f64,
    weights: &MaintainabilityWeights,
) -> f64 {
    let defaults = MaintainabilityWeights::default();
    let positive = |value: f64, fallback: f64| {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            fallback
        }
    };
    let a = positive(weights.complexity, defaults.complexity);
    let b = positive(weights.volume, defaults.volume);
    let w = positive(weights.comments, defaults.comments);

    let ratio = if comment_ratio.is_finite() {
        comment_ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let penalty = a * complexity as f64 + b * (lines_of_code as f64).ln_1p();
    let size_factor = MI_BASE / (MI_BASE + penalty);
    let comment_factor = (1.0 + w * (2.4 * ratio).sqrt().sin()) / (1.0 + w);

    100.0 * size_factor * comment_factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_classification() {
        let source = r#"// header comment
const a = 1; // trailing

/*
 * block
 */
const url = "http://example.com";
const t = `line one
// not a comment
`;
"#;
        let metrics = scan_lines(source);
        assert_eq!(metrics.total_lines, 10);
        // a, url, t (3 lines of template)
        assert_eq!(metrics.code_lines, 5);
        // header, trailing, 3 block lines
        assert_eq!(metrics.comment_lines, 5);
        assert!((metrics.comment_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_source_metrics() {
        let metrics = scan_lines("");
        assert_eq!(metrics, LineMetrics::default());
        assert_eq!(metrics.comment_ratio(), 0.0);
    }

    #[test]
    fn test_bracket_overflow() {
        let nested = "{".repeat(10_000);
        assert_eq!(bracket_overflow(&nested, 128), Some(1));

        let shallow = "function f() { if (a) { return [1, 2]; } }";
        assert_eq!(bracket_overflow(shallow, 128), None);

        // Brackets inside strings and comments do not count
        let literal = format!("const s = \"{}\"; // {}", "(".repeat(500), "[".repeat(500));
        assert_eq!(bracket_overflow(&literal, 128), None);
    }

    #[test]
    fn test_regex_literals_are_code() {
        let source = "const re = /https?:\\/\\//;\nconst tick = /`/;\n// real comment\nconst half = (total / 2) / 3; // note\nif (/[(]/.test(s)) { return /\\/*x/; }\n";
        let metrics = scan_lines(source);
        assert_eq!(metrics.total_lines, 5);
        assert_eq!(metrics.code_lines, 4);
        // the real comment and the trailing note
        assert_eq!(metrics.comment_lines, 2);

        let classes = "if (/[(]/.test(s)) { run(); }\n".repeat(300);
        assert_eq!(bracket_overflow(&classes, 128), None);

        let jsx = "const b = () => (<b>x</b>);\n".repeat(300);
        assert_eq!(bracket_overflow(&jsx, 128), None);
    }

    #[test]
    fn test_operator_chain_overflow() {
        let concat = format!("const s = {}'x';\n", "'x' + ".repeat(5_000));
        assert_eq!(operator_chain_overflow(&concat, 1_000), Some(1));

        // One operator per line, continued by the trailing `&&`
        let guard = format!("if (\n{}  ready\n) {{}}\n", "  a &&\n".repeat(2_000));
        assert_eq!(operator_chain_overflow(&guard, 1_000), Some(1_002));

        let statements = "const a = b + c;\n".repeat(5_000);
        assert_eq!(operator_chain_overflow(&statements, 1_000), None);

        let no_semicolons = "x = y + z\n".repeat(5_000);
        assert_eq!(operator_chain_overflow(&no_semicolons, 1_000), None);

        let elements = format!("const xs = [{}];\n", "a + 1, ".repeat(5_000));
        assert_eq!(operator_chain_overflow(&elements, 1_000), None);
    }

    #[test]
    fn test_complexity_tracker() {
        let mut tracker = ComplexityTracker::new();
        tracker.decision(); // top level

        tracker.enter_function();
        tracker.decision();
        tracker.enter_block();
        tracker.enter_function();
        let inner = tracker.exit_function();
        tracker.exit_block();
        let outer = tracker.exit_function();

        assert_eq!(inner, 1);
        assert_eq!(outer, 2);
        assert_eq!(tracker.file_complexity(), 4);
        assert_eq!(tracker.max_depth(), 3);
    }

    #[test]
    fn test_maintainability_monotonicity() {
        let weights = MaintainabilityWeights::default();

        let base = maintainability_index(5, 100, 0.2, &weights);
        assert!(maintainability_index(6, 100, 0.2, &weights) < base);
        assert!(maintainability_index(5, 101, 0.2, &weights) < base);
        assert!(maintainability_index(5, 100, 0.21, &weights) > base);

        let mut previous = maintainability_index(1, 50, 0.0, &weights);
        for step in 1..=100 {
            let next = maintainability_index(1, 50, step as f64 / 100.0, &weights);
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_maintainability_range() {
        let weights = MaintainabilityWeights::default();
        let top = maintainability_index(0, 0, 1.0, &weights);
        assert!(top <= 100.0 && top > 99.0);

        let huge = maintainability_index(usize::MAX / 2, usize::MAX / 2, 0.0, &weights);
        assert!(huge.is_finite());
        assert!(huge >= 0.0);

        let nan = maintainability_index(3, 10, f64::NAN, &weights);
        assert!(nan.is_finite());
    }

    #[test]
    fn test_invalid_weights_fall_back() {
        let broken = MaintainabilityWeights {
            complexity: -1.0,
            volume: f64::NAN,
            comments: 0.0,
        };
        let expected = maintainability_index(4, 40, 0.3, &MaintainabilityWeights::default());
        assert_eq!(maintainability_index(4, 40, 0.3, &broken), expected);
    }
}
