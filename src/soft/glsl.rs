//! A small hand-written GLSL front end.
//!
//! It does not type-check. It rejects sources that are structurally broken
//! (missing `#version`, unbalanced delimiters, missing statement terminators,
//! no `main`) and extracts the default-block uniform declarations.

use crate::gl;
use std::collections::HashSet;
use std::fmt;

/// A uniform declared at global scope.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Uniform {
    pub name: String,
    pub ty: u32,
    pub size: i32,
    pub array: bool,
    pub active: bool,
}

/// A compile diagnostic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Diagnostic {
    line: usize,
    message: String,
}

impl Diagnostic {
    fn new<S: Into<String>>(line: usize, message: S) -> Self {
        Self { line, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0:{}: error: {}", self.line, self.message)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Kind {
    Ident(String),
    Number(String),
    Punct(char),
}

#[derive(Clone, Debug)]
struct Token {
    kind: Kind,
    line: usize,
}

impl Token {
    fn ident(&self) -> Option<&str> {
        match self.kind {
            Kind::Ident(ref ident) => Some(ident),
            _ => None,
        }
    }

    fn is_punct(&self, c: char) -> bool {
        self.kind == Kind::Punct(c)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            Kind::Ident(ref text) | Kind::Number(ref text) => write!(f, "`{}`", text),
            Kind::Punct(c) => write!(f, "`{}`", c),
        }
    }
}

/// Checks `source`, returning its global uniforms.
pub(crate) fn compile(source: &str) -> Result<Vec<Uniform>, Diagnostic> {
    let tokens = tokenize(source)?;
    check_delimiters(&tokens)?;
    check_main(&tokens)?;
    uniforms(&tokens)
}

fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    let mut tokens = Vec::new();
    let mut version = false;
    let mut line = 1;
    let mut line_start = true;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                line += 1;
                line_start = true;
                continue;
            }
            c if c.is_whitespace() => continue,
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().map_or(false, |&c| c != '\n') {
                    chars.next();
                }
                continue;
            }
            '/' if chars.peek() == Some(&'*') => {
                let start = line;
                chars.next();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == '\n' {
                        line += 1;
                    } else if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(Diagnostic::new(start, "unterminated comment"));
                }
                continue;
            }
            '#' if line_start => {
                let mut directive = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    directive.push(c);
                    chars.next();
                }
                let mut words = directive.split_whitespace();
                if words.next() == Some("version") {
                    if version || !tokens.is_empty() {
                        return Err(Diagnostic::new(line, "#version must occur first, and only once"));
                    }
                    match words.next().map(str::parse::<u32>) {
                        Some(Ok(_)) => version = true,
                        _ => return Err(Diagnostic::new(line, "invalid #version directive")),
                    }
                } else if !version {
                    return Err(Diagnostic::new(line, "missing #version directive"));
                }
                continue;
            }
            _ => {}
        }

        line_start = false;
        if !version {
            return Err(Diagnostic::new(line, "missing #version directive"));
        }

        let kind = if c.is_ascii_alphabetic() || c == '_' {
            let mut ident = c.to_string();
            while let Some(&c) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                ident.push(c);
                chars.next();
            }
            Kind::Ident(ident)
        } else if c.is_ascii_digit() || (c == '.' && chars.peek().map_or(false, char::is_ascii_digit)) {
            let mut number = c.to_string();
            while let Some(&c) = chars.peek() {
                let exponent_sign = (c == '-' || c == '+') && number.ends_with(|e| e == 'e' || e == 'E');
                if !(c.is_ascii_alphanumeric() || c == '.' || exponent_sign) {
                    break;
                }
                number.push(c);
                chars.next();
            }
            Kind::Number(number)
        } else if "{}()[];,.=+-*/%<>!&|^~?:".contains(c) {
            Kind::Punct(c)
        } else {
            return Err(Diagnostic::new(line, format!("unexpected character `{}`", c)));
        };
        tokens.push(Token { kind, line });
    }

    if !version {
        return Err(Diagnostic::new(line, "missing #version directive"));
    }
    Ok(tokens)
}

/// Checks delimiter nesting and that every statement block is terminated.
fn check_delimiters(tokens: &[Token]) -> Result<(), Diagnostic> {
    // (opening token, is an initializer list)
    let mut stack: Vec<(&Token, bool)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let previous = if i > 0 { Some(&tokens[i - 1]) } else { None };
        match token.kind {
            Kind::Punct('{') => {
                let enclosing_initializer = stack
                    .last()
                    .map_or(false, |&(open, initializer)| open.is_punct('{') && initializer);
                let initializer = previous.map_or(false, |p| {
                    p.is_punct('=') || (enclosing_initializer && (p.is_punct(',') || p.is_punct('{')))
                });
                stack.push((token, initializer));
            }
            Kind::Punct('(') | Kind::Punct('[') => stack.push((token, false)),
            Kind::Punct(close @ '}') | Kind::Punct(close @ ')') | Kind::Punct(close @ ']') => {
                let open = match close {
                    '}' => '{',
                    ')' => '(',
                    _ => '[',
                };
                match stack.pop() {
                    Some((opening, initializer)) if opening.is_punct(open) => {
                        let terminated = previous.map_or(false, |p| {
                            p.is_punct(';') || p.is_punct('{') || p.is_punct('}')
                        });
                        if close == '}' && !initializer && !terminated {
                            return Err(Diagnostic::new(
                                token.line,
                                format!("syntax error, unexpected {}, expecting `;`", token),
                            ));
                        }
                    }
                    _ => {
                        return Err(Diagnostic::new(
                            token.line,
                            format!("syntax error, unexpected {}", token),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((opening, _)) = stack.pop() {
        return Err(Diagnostic::new(opening.line, format!("unclosed {}", opening)));
    }
    match tokens.last() {
        Some(last) if !(last.is_punct(';') || last.is_punct('}')) => Err(Diagnostic::new(
            last.line,
            "syntax error, unexpected end of file",
        )),
        _ => Ok(()),
    }
}

fn check_main(tokens: &[Token]) -> Result<(), Diagnostic> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            Kind::Punct('{') | Kind::Punct('(') | Kind::Punct('[') => depth += 1,
            Kind::Punct('}') | Kind::Punct(')') | Kind::Punct(']') => depth -= 1,
            _ => {}
        }
        if depth == 0
            && token.ident() == Some("void")
            && tokens.get(i + 1).and_then(Token::ident) == Some("main")
            && tokens.get(i + 2).map_or(false, |t| t.is_punct('('))
        {
            return Ok(());
        }
    }
    let line = tokens.last().map_or(1, |t| t.line);
    Err(Diagnostic::new(line, "no function with name 'main' defined"))
}

/// Maps a GLSL type keyword onto its uniform type enumerant.
fn uniform_type(ident: &str) -> Option<u32> {
    let ty = match ident {
        "float" => gl::FLOAT,
        "vec2" => gl::FLOAT_VEC2,
        "vec3" => gl::FLOAT_VEC3,
        "vec4" => gl::FLOAT_VEC4,
        "int" => gl::INT,
        "ivec2" => gl::INT_VEC2,
        "ivec3" => gl::INT_VEC3,
        "ivec4" => gl::INT_VEC4,
        "uint" => gl::UNSIGNED_INT,
        "uvec2" => gl::UNSIGNED_INT_VEC2,
        "uvec3" => gl::UNSIGNED_INT_VEC3,
        "uvec4" => gl::UNSIGNED_INT_VEC4,
        "bool" => gl::BOOL,
        "bvec2" => gl::BOOL_VEC2,
        "bvec3" => gl::BOOL_VEC3,
        "bvec4" => gl::BOOL_VEC4,
        "mat2" => gl::FLOAT_MAT2,
        "mat3" => gl::FLOAT_MAT3,
        "mat4" => gl::FLOAT_MAT4,
        "mat2x3" => gl::FLOAT_MAT2x3,
        "mat2x4" => gl::FLOAT_MAT2x4,
        "mat3x2" => gl::FLOAT_MAT3x2,
        "mat3x4" => gl::FLOAT_MAT3x4,
        "mat4x2" => gl::FLOAT_MAT4x2,
        "mat4x3" => gl::FLOAT_MAT4x3,
        "sampler1D" => gl::SAMPLER_1D,
        "sampler2D" => gl::SAMPLER_2D,
        "sampler3D" => gl::SAMPLER_3D,
        "samplerCube" => gl::SAMPLER_CUBE,
        "sampler1DArray" => gl::SAMPLER_1D_ARRAY,
        "sampler2DArray" => gl::SAMPLER_2D_ARRAY,
        "sampler2DShadow" => gl::SAMPLER_2D_SHADOW,
        "isampler2D" => gl::INT_SAMPLER_2D,
        "usampler2D" => gl::UNSIGNED_INT_SAMPLER_2D,
        _ => return None,
    };
    Some(ty)
}

const PRECISIONS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Parses global `uniform` declarations and marks the ones referenced
/// outside their own declaration as active.
fn uniforms(tokens: &[Token]) -> Result<Vec<Uniform>, Diagnostic> {
    let structs: HashSet<&str> = tokens
        .windows(2)
        .filter(|pair| pair[0].ident() == Some("struct"))
        .filter_map(|pair| pair[1].ident())
        .collect();

    let mut uniforms = Vec::new();
    let mut names = HashSet::new();
    let mut declarations = HashSet::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            Kind::Punct('{') | Kind::Punct('(') | Kind::Punct('[') => depth += 1,
            Kind::Punct('}') | Kind::Punct(')') | Kind::Punct(']') => depth -= 1,
            _ => {}
        }
        if depth != 0 || token.ident() != Some("uniform") {
            i += 1;
            continue;
        }

        i += 1;
        while tokens.get(i).and_then(Token::ident).map_or(false, |q| PRECISIONS.contains(&q)) {
            i += 1;
        }
        let type_token = tokens
            .get(i)
            .ok_or_else(|| Diagnostic::new(token.line, "syntax error, unexpected end of file"))?;
        let type_name = type_token.ident().ok_or_else(|| {
            Diagnostic::new(type_token.line, format!("syntax error, unexpected {}", type_token))
        })?;
        if tokens.get(i + 1).map_or(false, |t| t.is_punct('{')) {
            // Uniform blocks are not part of the default block.
            i += 1;
            continue;
        }
        let ty = match uniform_type(type_name) {
            Some(ty) => Some(ty),
            None if structs.contains(type_name) => None,
            None => {
                return Err(Diagnostic::new(
                    type_token.line,
                    format!("`{}` is not a valid uniform type", type_name),
                ));
            }
        };
        i += 1;

        // One or more declarators separated by commas.
        loop {
            let name_token = tokens
                .get(i)
                .ok_or_else(|| Diagnostic::new(type_token.line, "syntax error, unexpected end of file"))?;
            let name = name_token.ident().ok_or_else(|| {
                Diagnostic::new(name_token.line, format!("syntax error, unexpected {}", name_token))
            })?;
            declarations.insert(i);
            i += 1;

            let mut size = 1;
            let array = tokens.get(i).map_or(false, |t| t.is_punct('['));
            if array {
                let closed = tokens.get(i + 2).map_or(false, |t| t.is_punct(']'));
                let literal = match tokens.get(i + 1).map(|t| &t.kind) {
                    Some(Kind::Number(n)) if closed => n.trim_end_matches(|c| c == 'u' || c == 'U').parse().ok(),
                    _ => None,
                };
                size = literal.filter(|&n: &i32| n > 0).ok_or_else(|| {
                    Diagnostic::new(name_token.line, "array size must be a positive integer constant")
                })?;
                i += 3;
            }

            if !names.insert(name) {
                return Err(Diagnostic::new(name_token.line, format!("redeclaration of `{}`", name)));
            }
            if let Some(ty) = ty {
                uniforms.push(Uniform { name: name.to_string(), ty, size, array, active: false });
            }

            // Skip an initializer.
            let mut nesting = 0usize;
            while let Some(t) = tokens.get(i) {
                match t.kind {
                    Kind::Punct('(') | Kind::Punct('[') | Kind::Punct('{') => nesting += 1,
                    Kind::Punct(')') | Kind::Punct(']') | Kind::Punct('}') => nesting -= 1,
                    Kind::Punct(',') | Kind::Punct(';') if nesting == 0 => break,
                    _ => {}
                }
                i += 1;
            }
            match tokens.get(i) {
                Some(t) if t.is_punct(',') => i += 1,
                _ => break,
            }
        }
    }

    for (i, token) in tokens.iter().enumerate() {
        if declarations.contains(&i) {
            continue;
        }
        if let Some(ident) = token.ident() {
            for uniform in uniforms.iter_mut().filter(|u| u.name == ident) {
                uniform.active = true;
            }
        }
    }
    Ok(uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "
        #version 330 core
        layout(location = 0) in vec3 position;
        uniform mat4 mvp; // transform
        uniform float unused;
        uniform vec4 lights[4], tint;
        void main() {
            gl_Position = mvp * vec4(position, 1.0) + lights[1] * tint.x;
        }
    ";

    fn message(source: &str) -> String {
        compile(source).unwrap_err().to_string()
    }

    #[test]
    fn collects_uniforms_and_activity() {
        let uniforms = compile(VERTEX).unwrap();
        let summary: Vec<_> = uniforms
            .iter()
            .map(|u| (u.name.as_str(), u.ty, u.size, u.active))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("mvp", gl::FLOAT_MAT4, 1, true),
                ("unused", gl::FLOAT, 1, false),
                ("lights", gl::FLOAT_VEC4, 4, true),
                ("tint", gl::FLOAT_VEC4, 1, true),
            ],
        );
    }

    #[test]
    fn rejects_missing_version() {
        assert_eq!(message("void main() {}"), "0:1: error: missing #version directive");
    }

    #[test]
    fn rejects_missing_semicolon() {
        let source = "#version 330\nvoid main() {\n    float x = 1.0\n}\n";
        assert_eq!(message(source), "0:4: error: syntax error, unexpected `}`, expecting `;`");
    }

    #[test]
    fn rejects_unbalanced_delimiters() {
        assert!(message("#version 330\nvoid main() { float x = (1.0; }").contains("unexpected `}`"));
        assert!(message("#version 330\nvoid main() {\n").contains("unclosed `{`"));
        assert!(message("#version 330\nvoid main()) {}").contains("unexpected `)`"));
    }

    #[test]
    fn requires_main() {
        assert!(message("#version 330\nvoid other() {}").contains("'main'"));
    }

    #[test]
    fn accepts_initializer_lists_and_blocks() {
        let source = "
            #version 450
            /* lighting
               inputs */
            uniform Lights { vec4 colors[8]; } lights;
            struct Material { vec4 albedo; };
            uniform Material material;
            const vec2 offsets[2] = { vec2(0.0, 1.0), vec2(1.0, 0.0) };
            out vec4 color;
            void main() { color = lights.colors[0] * material.albedo + offsets[0].xyxy; }
        ";
        assert_eq!(compile(source).unwrap(), vec![]);
    }

    #[test]
    fn rejects_redeclared_uniforms() {
        let source = "#version 330\nuniform float a;\nuniform vec2 a;\nvoid main() {}";
        assert_eq!(message(source), "0:3: error: redeclaration of `a`");
    }
}
