//! Fixed keyword lists used to sniff which language a snippet is in.
//!
//! These are plain lower-case substring checks. Both languages share a lot of
//! vocabulary (`class `, `using `, `new `), so misclassification is expected.

/// Indicators a table cell is VB.NET.
pub const VB_INDICATORS: &[&str] = &[
    "dim ", "sub ", "function ", "end sub", "end function", "end class",
    "namespace ", "imports ", "byval ", "byref ", "as ", "if ", "then ",
    "elseif ", "else ", "end if", "for ", "next ", "while ", "end while",
    "do ", "loop ", "select case", "end select", "class ", "structure ",
    "interface ", "enum ", "end enum", "property ", "end property",
    "public ", "private ", "protected ", "friend ", "shared ", "overridable ",
    "overrides ", "mustoverride ", "notinheritable ", "mustinherit ",
    "const ", "readonly ", "new ", "nothing ", "true ", "false ",
    "console.writeline", "console.read", "string.format", "convert.to",
    "try ", "catch ", "finally ", "end try", "throw ", "on error ",
    "with ", "end with", "using ", "end using", "synclock ", "end synclock",
];

/// Indicators a table cell is C#.
pub const CSHARP_INDICATORS: &[&str] = &[
    "using ", "namespace ", "class ", "public ", "private ", "protected ",
    "internal ", "static ", "void ", "int ", "string ", "bool ", "var ",
    "if ", "else ", "for ", "while ", "do ", "switch ", "case ", "default ",
    "break ", "continue ", "return ", "new ", "null ", "true ", "false ",
    "try ", "catch ", "finally ", "throw ", "lock ", "async ",
    "await ", "interface ", "enum ", "struct ", "delegate ", "event ",
    "property ", "get ", "set ", "virtual ", "override ", "abstract ",
    "sealed ", "partial ", "const ", "readonly ", "out ", "ref ", "params ",
    "this ", "base ", "typeof ", "is ", "as ", "in ", "where ", "select ",
    "from ", "orderby ", "group ", "join ", "let ", "into ", "by ",
    "console.writeline", "console.read", "string.format", "convert.to",
    "math.", "system.", "list<", "dictionary<", "ienumerable<", "task<",
];

/// Short list for classifying bare `<pre>` / `<code>` blocks as VB.NET.
pub const GENERIC_VB: &[&str] = &["dim ", "sub ", "function ", "end sub", "end function"];

/// Short list for classifying bare `<pre>` / `<code>` blocks as C#.
pub const GENERIC_CSHARP: &[&str] = &["var ", "public ", "private ", "class ", "namespace "];

/// Words suggesting a page talks about VB.NET / C# translation at all.
pub const TRANSLATION_KEYWORDS: &[&str] = &[
    "vb.net", "visual basic", "c#", "csharp", "translation", "convert",
    "equivalent", "comparison", "migration", "port",
];

/// Hints shown to an operator whose pasted VB.NET looks unusual.
pub const VB_ENTRY_HINTS: &[&str] = &[
    "dim ", "sub ", "function ", "end sub", "end function", "if ", "then",
    "else", "for ", "next", "while ", "wend", "try ", "catch ", "finally ",
    "end try", "with ", "end with",
];

/// Hints shown to an operator whose pasted C# looks unusual.
pub const CSHARP_ENTRY_HINTS: &[&str] = &[
    "using ", "namespace ", "class ", "public ", "private ", "static ",
    "void ", "int ", "string ", "var ", "if ", "else", "for ", "while ",
    "try ", "catch ", "finally ",
];

/// Case-insensitive: does `text` contain any of `keywords`?
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

pub fn looks_like_vb(text: &str) -> bool {
    contains_any(text, VB_INDICATORS)
}

pub fn looks_like_csharp(text: &str) -> bool {
    contains_any(text, CSHARP_INDICATORS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vb_detection() {
        assert!(looks_like_vb("Dim x As Integer"));
        assert!(looks_like_vb("Private Sub Foo()\nEnd Sub"));
        assert!(!looks_like_vb("x = 1"));
    }

    #[test]
    fn test_csharp_detection() {
        assert!(looks_like_csharp("int x;"));
        assert!(looks_like_csharp("var list = new List<int>();"));
        assert!(!looks_like_csharp("x++;"));
    }

    #[test]
    fn test_shared_vocabulary_matches_both() {
        let text = "Public Class Widget";
        assert!(looks_like_vb(text));
        assert!(looks_like_csharp(text));
    }

    #[test]
    fn test_contains_any_is_case_insensitive() {
        assert!(contains_any("END SUB", GENERIC_VB));
        assert!(contains_any("Namespace Foo", GENERIC_CSHARP));
        assert!(!contains_any("hello", TRANSLATION_KEYWORDS));
    }
}
