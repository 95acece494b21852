//! [`GraphEngine`] over an in-memory oxigraph store.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{Subject, Term as OxTerm};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::engine::{EngineFactory, GraphEngine};
use crate::term::{Binding, Term};

const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// In-memory oxigraph store.
pub struct OxigraphEngine {
    store: Store,
}

impl OxigraphEngine {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            store: Store::new()?,
        })
    }

    /// Factory creating a fresh store for every bootstrap.
    pub fn factory() -> impl EngineFactory {
        || -> anyhow::Result<Arc<dyn GraphEngine>> { Ok(Arc::new(OxigraphEngine::new()?)) }
    }

    /// Number of quads currently stored.
    pub fn len(&self) -> anyhow::Result<usize> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.store.is_empty()?)
    }
}

#[async_trait]
impl GraphEngine for OxigraphEngine {
    async fn load(
        &self,
        content: &str,
        format: &str,
        base_iri: Option<&str>,
    ) -> anyhow::Result<()> {
        let rdf_format = RdfFormat::from_media_type(format)
            .ok_or_else(|| anyhow!("unsupported serialization format: {format}"))?;
        let mut parser = RdfParser::from_format(rdf_format);
        if let Some(base) = base_iri.filter(|b| !b.is_empty()) {
            parser = parser.with_base_iri(base)?;
        }
        self.store.load_from_reader(parser, content.as_bytes())?;
        Ok(())
    }

    async fn query(&self, text: &str) -> anyhow::Result<Vec<Binding>> {
        match self.store.query(text)? {
            QueryResults::Solutions(solutions) => {
                let mut bindings = Vec::new();
                for solution in solutions {
                    let solution = solution?;
                    bindings.push(Binding::from_pairs(
                        solution
                            .iter()
                            .map(|(variable, term)| (variable.as_str(), convert_term(term))),
                    ));
                }
                Ok(bindings)
            }
            QueryResults::Boolean(answer) => Ok(vec![Binding::from_pairs([(
                "result",
                Term::typed_literal(answer.to_string(), XSD_BOOLEAN),
            )])]),
            QueryResults::Graph(triples) => {
                let mut bindings = Vec::new();
                for triple in triples {
                    let triple = triple?;
                    bindings.push(Binding::from_pairs([
                        ("subject", convert_subject(&triple.subject)),
                        ("predicate", Term::named(triple.predicate.as_str())),
                        ("object", convert_term(&triple.object)),
                    ]));
                }
                Ok(bindings)
            }
        }
    }

    async fn update(&self, text: &str) -> anyhow::Result<()> {
        self.store.update(text)?;
        Ok(())
    }
}

fn convert_subject(subject: &Subject) -> Term {
    match subject {
        Subject::NamedNode(node) => Term::named(node.as_str()),
        Subject::BlankNode(node) => Term::blank(node.as_str()),
        #[allow(unreachable_patterns)]
        other => Term::literal(other.to_string()),
    }
}

fn convert_term(term: &OxTerm) -> Term {
    match term {
        OxTerm::NamedNode(node) => Term::named(node.as_str()),
        OxTerm::BlankNode(node) => Term::blank(node.as_str()),
        OxTerm::Literal(literal) => match literal.language() {
            Some(language) => Term::lang_literal(literal.value(), language),
            None => Term::typed_literal(literal.value(), literal.datatype().as_str()),
        },
        #[allow(unreachable_patterns)]
        other => Term::literal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_turtle_and_answers_select() {
        let engine = OxigraphEngine::new().unwrap();
        engine
            .load(
                "@prefix t: <urn:a#> .\n<#x> a t:Thing ; t:label \"X\"@en .",
                "text/turtle",
                Some("urn:a#"),
            )
            .await
            .unwrap();

        let rows = engine
            .query("SELECT ?x ?l WHERE { ?x a <urn:a#Thing> ; <urn:a#label> ?l }")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("x"), Some(&Term::named("urn:a#x")));
        assert_eq!(rows[0].get("l"), Some(&Term::lang_literal("X", "en")));
    }

    #[tokio::test]
    async fn update_then_ask() {
        let engine = OxigraphEngine::new().unwrap();
        engine
            .update("INSERT DATA { <urn:a#y> a <urn:a#Thing> }")
            .await
            .unwrap();
        let rows = engine
            .query("ASK { <urn:a#y> a <urn:a#Thing> }")
            .await
            .unwrap();
        assert_eq!(rows[0].get("result"), Some(&Term::typed_literal("true", XSD_BOOLEAN)));
    }

    #[tokio::test]
    async fn parse_errors_surface() {
        let engine = OxigraphEngine::new().unwrap();
        let err = engine
            .load("this is not turtle", "text/turtle", None)
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
