//! Shared fixtures for knowledge-layer tests.

use std::io::Write;

use tempfile::NamedTempFile;

use amparo_config::DomainConfig;

use crate::corpus::CorpusStore;

pub(crate) const SAMPLE_CORPUS: &str = r#"{
    "documents": [
        {
            "id": "inst-01",
            "titulo": "Defensa Pública de Mendoza",
            "contenido": "Organismo que garantiza el acceso a la justicia de manera gratuita.",
            "tipo": "informacion",
            "seccion": "institucional",
            "tags": ["general"]
        },
        {
            "id": "contacto-01",
            "titulo": "Sede Central",
            "contenido": "Av. España 480, Ciudad de Mendoza. Tel: 0800-555-JUSTICIA.",
            "tipo": "informacion",
            "seccion": "contacto",
            "tags": ["general", "sede-central"]
        },
        {
            "id": "fam-01",
            "titulo": "Fuero de Familia",
            "contenido": "Atiende divorcios, cuota alimentaria y violencia familiar.",
            "tipo": "informacion",
            "seccion": "familia",
            "tags": ["familia", "divorcio", "cuota alimentaria"]
        },
        {
            "id": "fam-02",
            "titulo": "Divorcio de común acuerdo",
            "contenido": "Se tramita ante el juez de familia con patrocinio gratuito.",
            "tipo": "tramite",
            "seccion": "familia",
            "tags": ["familia", "divorcio"]
        },
        {
            "id": "faq-01",
            "titulo": "¿Cómo inicio un divorcio?",
            "contenido": "Acercate a la delegación más cercana con tu DNI y acta de matrimonio.",
            "tipo": "pregunta_respuesta",
            "seccion": "familia",
            "tags": ["familia", "divorcio"]
        }
    ]
}"#;

pub(crate) fn domain_config(id: &str, tag: &str) -> DomainConfig {
    DomainConfig {
        id: id.into(),
        title: String::new(),
        tag: tag.into(),
        guidance: String::new(),
    }
}

pub(crate) fn sample_domains() -> Vec<DomainConfig> {
    vec![
        domain_config("general", ""),
        domain_config("familia", ""),
        domain_config("penal_juvenil", "penal-juvenil"),
    ]
}

/// A store over [`SAMPLE_CORPUS`]. The temp file must outlive the store so
/// reload tests can rewrite it.
pub(crate) fn sample_store() -> (NamedTempFile, CorpusStore) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SAMPLE_CORPUS.as_bytes()).unwrap();
    let store = CorpusStore::open(file.path(), &sample_domains());
    (file, store)
}
