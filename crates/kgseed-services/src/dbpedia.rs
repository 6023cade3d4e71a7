//! DBpedia resource types, plus the combined type service handed to the
//! engine.

use crate::sparql::{iri_ref, SparqlClient};
use crate::wikidata::{is_schema_org, WikidataCrossReference};
use async_trait::async_trait;
use kgseed_core::{CollaboratorResult, SchemaType, TypeLookup, TypeSet};

#[derive(Debug, Clone)]
pub struct DbpediaTypes {
    sparql: SparqlClient,
}

impl DbpediaTypes {
    pub fn new(sparql: SparqlClient) -> Self {
        Self { sparql }
    }

    /// schema.org types asserted for `resource`, local names only.
    pub async fn schema_types(&self, resource: &str) -> CollaboratorResult<TypeSet> {
        let query = format!(
            "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\nSELECT ?type WHERE {{ {} rdf:type ?type . }}",
            iri_ref(resource)
        );
        let rows = self.sparql.select(&query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove("type"))
            .filter(|iri| is_schema_org(iri))
            .map(SchemaType::new)
            .collect())
    }
}

/// Resource types from DBpedia, class-hierarchy types from Wikidata.
pub struct LinkedDataTypes {
    dbpedia: DbpediaTypes,
    wikidata: WikidataCrossReference,
}

impl LinkedDataTypes {
    pub fn new(dbpedia: DbpediaTypes, wikidata: WikidataCrossReference) -> Self {
        Self { dbpedia, wikidata }
    }
}

#[async_trait]
impl TypeLookup for LinkedDataTypes {
    async fn types_of(&self, linked_data_uri: &str) -> CollaboratorResult<TypeSet> {
        self.dbpedia.schema_types(linked_data_uri).await
    }

    async fn canonical_types(&self, canonical_id: &str) -> CollaboratorResult<TypeSet> {
        self.wikidata.canonical_types(canonical_id).await
    }
}
