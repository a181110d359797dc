//! Class-diagram description derived from declaration headers in the
//! artifact text. A small dedicated scanner, not ad hoc pattern matching:
//! each header opens a body that runs to the next header, methods come from
//! `def` headers whose first parameter is the self reference, attributes
//! from assignments inside the constructor.

use quizforge_common::{ClassDescriptor, ClassMember, Visibility};

const CONSTRUCTOR: &str = "__init__";

/// Structured record set suitable for a graph-rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDiagram {
    pub classes: Vec<ClassDescriptor>,
}

impl ClassDiagram {
    /// Inheritance edges as (child, parent) pairs.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.classes
            .iter()
            .filter_map(|class| {
                class
                    .parent
                    .as_deref()
                    .map(|parent| (class.name.as_str(), parent))
            })
            .collect()
    }
}

/// Scan declaration boundaries. Returns None when the text declares no types.
pub fn scan(text: &str) -> Option<ClassDiagram> {
    let mut classes: Vec<ClassDescriptor> = Vec::new();
    let mut in_constructor = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some((name, parent)) = parse_class_header(trimmed) {
            classes.push(ClassDescriptor {
                name,
                parent,
                attributes: Vec::new(),
                methods: Vec::new(),
            });
            in_constructor = false;
            continue;
        }

        let Some(current) = classes.last_mut() else {
            continue;
        };

        if let Some((name, self_first)) = parse_method_header(trimmed) {
            in_constructor = self_first && name == CONSTRUCTOR;
            if self_first {
                push_unique(&mut current.methods, name);
            }
            continue;
        }

        if in_constructor {
            if let Some(attribute) = parse_attribute_assignment(trimmed) {
                push_unique(&mut current.attributes, attribute);
            }
        }
    }

    if classes.is_empty() {
        None
    } else {
        Some(ClassDiagram { classes })
    }
}

/// Graphviz rendering of the descriptor set: one record node per class,
/// UML visibility glyphs, and an empty-arrow edge per inheritance link.
pub fn to_dot(diagram: &ClassDiagram) -> String {
    let mut out = String::from("digraph classes {\n");
    out.push_str("    node [shape=record, fontname=\"Helvetica\"];\n");

    for class in &diagram.classes {
        let attributes = members_label(&class.attributes, "");
        let methods = members_label(&class.methods, "()");
        out.push_str(&format!(
            "    \"{}\" [label=\"{{{}|{}|{}}}\"];\n",
            class.name, class.name, attributes, methods
        ));
    }
    for (child, parent) in diagram.edges() {
        out.push_str(&format!(
            "    \"{child}\" -> \"{parent}\" [arrowhead=empty];\n"
        ));
    }

    out.push_str("}\n");
    out
}

fn members_label(members: &[ClassMember], suffix: &str) -> String {
    members
        .iter()
        .map(|member| {
            let glyph = match member.visibility {
                Visibility::Public => '+',
                Visibility::Private => '-',
            };
            format!("{} {}{}\\l", glyph, member.name, suffix)
        })
        .collect()
}

fn push_unique(members: &mut Vec<ClassMember>, name: String) {
    if !members.iter().any(|m| m.name == name) {
        members.push(ClassMember::new(name));
    }
}

fn ident_prefix(s: &str) -> &str {
    let end = s
        .char_indices()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    &s[..end]
}

/// `class Name:` or `class Name(Parent):`
fn parse_class_header(line: &str) -> Option<(String, Option<String>)> {
    let rest = line.strip_prefix("class ")?;
    let name = ident_prefix(rest.trim_start());
    if name.is_empty() {
        return None;
    }
    let after = rest.trim_start()[name.len()..].trim_start();

    let (parent, tail) = if let Some(inner_start) = after.strip_prefix('(') {
        let close = inner_start.find(')')?;
        let first_base = inner_start[..close].split(',').next().unwrap_or("").trim();
        let parent = if first_base.is_empty() {
            None
        } else {
            Some(first_base.to_string())
        };
        (parent, inner_start[close + 1..].trim_start())
    } else {
        (None, after)
    };

    if !tail.starts_with(':') {
        return None;
    }
    Some((name.to_string(), parent))
}

/// `def name(self, ...):` — returns (name, first parameter is self).
fn parse_method_header(line: &str) -> Option<(String, bool)> {
    let rest = line.strip_prefix("def ")?;
    let name = ident_prefix(rest.trim_start());
    if name.is_empty() {
        return None;
    }
    let after = rest.trim_start()[name.len()..].trim_start();
    let inner = after.strip_prefix('(')?;
    let first_param = inner
        .split([',', ')'])
        .next()
        .unwrap_or("")
        .trim();
    Some((name.to_string(), first_param == "self"))
}

/// `self.attr = value` (not `==`).
fn parse_attribute_assignment(line: &str) -> Option<String> {
    let rest = line.strip_prefix("self.")?;
    let name = ident_prefix(rest);
    if name.is_empty() {
        return None;
    }
    let after = rest[name.len()..].trim_start();
    let after_eq = after.strip_prefix('=')?;
    if after_eq.starts_with('=') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_common::Visibility;

    const SAMPLE: &str = r#"
Some prose around the code.

class Person:
    def __init__(self, name):
        self.name = name

class Student(Person):
    def __init__(self, name, enrollment):
        self.__name = name
        self.__enrollment = enrollment
        self.__name = name

    def get_name(self):
        return self.__name

    def set_name(self, new_name):
        self.__name = new_name

    def helper():
        return 42
"#;

    #[test]
    fn scanner_builds_one_descriptor_per_declaration() {
        let diagram = scan(SAMPLE).unwrap();
        assert_eq!(diagram.classes.len(), 2);
        assert_eq!(diagram.classes[0].name, "Person");
        assert!(diagram.classes[0].parent.is_none());
        assert_eq!(diagram.classes[1].name, "Student");
        assert_eq!(diagram.classes[1].parent.as_deref(), Some("Person"));
        assert_eq!(diagram.edges(), vec![("Student", "Person")]);
    }

    #[test]
    fn attributes_come_from_the_constructor_deduplicated() {
        let diagram = scan(SAMPLE).unwrap();
        let student = &diagram.classes[1];
        let names: Vec<&str> = student.attributes.iter().map(|a| a.name.as_str()).collect();
        // __name assigned twice in __init__, kept once; set_name's assignment
        // is outside the constructor and does not count
        assert_eq!(names, vec!["__name", "__enrollment"]);
        assert_eq!(student.attributes[0].visibility, Visibility::Private);
    }

    #[test]
    fn methods_require_a_self_first_parameter() {
        let diagram = scan(SAMPLE).unwrap();
        let student = &diagram.classes[1];
        let names: Vec<&str> = student.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["__init__", "get_name", "set_name"]);
    }

    #[test]
    fn no_declarations_means_no_diagram() {
        assert!(scan("prose only, def helper(): pass outside a class").is_none());
    }

    #[test]
    fn dot_rendering_carries_nodes_edges_and_visibility() {
        let diagram = scan(SAMPLE).unwrap();
        let dot = to_dot(&diagram);
        assert!(dot.starts_with("digraph classes {"));
        assert!(dot.contains("\"Student\""));
        assert!(dot.contains("- __name\\l"));
        assert!(dot.contains("+ get_name()\\l"));
        assert!(dot.contains("\"Student\" -> \"Person\" [arrowhead=empty];"));
    }
}
