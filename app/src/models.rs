//! Tipos do registro devolvido pela API pública de CNPJ (open.cnpja.com).
//!
//! Só os campos lidos pelo programa são tipados; o JSON bruto é mantido em
//! `ContextoConsulta` para exibição e exportação completas.

use serde::{Deserialize, Deserializer, Serialize};

/// Largura de uma subclasse CNAE (ex.: 5611201).
const CNAE_DIGITOS: usize = 7;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Estabelecimento {
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub tax_id: String,
    pub alias: Option<String>,
    pub founded: Option<String>,
    pub updated: Option<String>,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub head: bool,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub status: CodigoTexto,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub company: Empresa,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub address: Endereco,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub emails: Vec<Email>,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub phones: Vec<Telefone>,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub main_activity: Atividade,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub side_activities: Vec<Atividade>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Empresa {
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub name: String,
    pub equity: Option<f64>,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub nature: CodigoTexto,
    pub size: Option<Porte>,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub members: Vec<Socio>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Porte {
    pub acronym: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Socio {
    pub since: Option<String>,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub person: Pessoa,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub role: CodigoTexto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pessoa {
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub name: String,
    #[serde(deserialize_with = "codigo_como_texto")]
    pub age: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Endereco {
    pub street: Option<String>,
    pub number: Option<String>,
    pub details: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Email {
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Telefone {
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub area: String,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub number: String,
}

/// Par código/descrição usado em situação cadastral, natureza jurídica e qualificação.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodigoTexto {
    #[serde(deserialize_with = "codigo_como_texto")]
    pub id: String,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Atividade {
    #[serde(deserialize_with = "cnae_como_texto")]
    pub id: String,
    #[serde(deserialize_with = "nulo_como_padrao")]
    pub text: String,
}

/// `null` vira o valor padrão do campo, como se a chave estivesse ausente.
fn nulo_como_padrao<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aceita o código como número ou string.
fn codigo_como_texto<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// A API entrega a CNAE como número, perdendo o zero à esquerda das divisões
/// 01-09. Só um número de seis dígitos é uma subclasse que perdeu esse zero;
/// os demais números e as strings ficam como vieram.
fn cnae_como_texto<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => {
            let codigo = n.to_string();
            if codigo.len() == CNAE_DIGITOS - 1 {
                format!("0{}", codigo)
            } else {
                codigo
            }
        }
        _ => String::new(),
    })
}

impl Estabelecimento {
    pub fn primeiro_email(&self) -> Option<&str> {
        self.emails
            .first()
            .map(|e| e.address.as_str())
            .filter(|e| !e.is_empty())
    }
}

impl Endereco {
    /// "Rua X, 100 - Centro"
    pub fn linha_logradouro(&self) -> String {
        format!(
            "{}, {} - {}",
            texto_ou_na(&self.street),
            texto_ou_na(&self.number),
            texto_ou_na(&self.district)
        )
    }

    /// "São Paulo/SP - CEP: 01001000"
    pub fn linha_cidade(&self) -> String {
        format!(
            "{}/{} - CEP: {}",
            texto_ou_na(&self.city),
            texto_ou_na(&self.state),
            texto_ou_na(&self.zip)
        )
    }
}

pub fn texto_ou_na(valor: &Option<String>) -> &str {
    valor.as_deref().filter(|v| !v.is_empty()).unwrap_or("N/A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn cnae_numerica_recebe_zeros_a_esquerda() {
        let atividade: Atividade =
            serde_json::from_value(json!({ "id": 111301, "text": "Cultivo de arroz" })).unwrap();
        assert_eq!(atividade.id, "0111301");

        let atividade: Atividade =
            serde_json::from_value(json!({ "id": 5611201, "text": "Restaurantes" })).unwrap();
        assert_eq!(atividade.id, "5611201");
    }

    #[test]
    fn cnae_numerica_curta_nao_e_completada() {
        for (numero, esperado) in [(5611, "5611"), (8610, "8610"), (5510, "5510"), (47, "47")] {
            let atividade: Atividade = serde_json::from_value(json!({ "id": numero })).unwrap();
            assert_eq!(atividade.id, esperado);
        }
    }

    #[test]
    fn campos_nulos_usam_padrao() {
        let est: Estabelecimento = serde_json::from_value(json!({
            "taxId": null,
            "head": null,
            "status": { "id": null, "text": null },
            "company": { "name": null, "nature": null, "members": [
                { "person": { "name": null, "age": null }, "role": null }
            ] },
            "address": null,
            "emails": [{ "address": null }],
            "phones": [{ "area": "27", "number": null }],
            "mainActivity": { "id": 5611201, "text": null },
            "sideActivities": null
        }))
        .unwrap();

        assert!(!est.head);
        assert_eq!(est.tax_id, "");
        assert_eq!(est.status.text, "");
        assert_eq!(est.company.name, "");
        assert_eq!(est.company.members[0].person.name, "");
        assert_eq!(est.phones[0].area, "27");
        assert_eq!(est.phones[0].number, "");
        assert_eq!(est.primeiro_email(), None);
        assert_eq!(est.main_activity.id, "5611201");
        assert!(est.side_activities.is_empty());
    }

    #[test]
    fn cnae_em_texto_fica_como_veio() {
        let atividade: Atividade = serde_json::from_value(json!({ "id": "8610" })).unwrap();
        assert_eq!(atividade.id, "8610");
        assert_eq!(atividade.text, "");
    }

    #[test]
    fn campos_ausentes_usam_padrao() {
        let est: Estabelecimento = serde_json::from_value(json!({ "taxId": "31952078000130" })).unwrap();
        assert_eq!(est.tax_id, "31952078000130");
        assert_eq!(est.main_activity.id, "");
        assert!(est.company.members.is_empty());
        assert_eq!(est.primeiro_email(), None);
        assert_eq!(est.address.linha_cidade(), "N/A/N/A - CEP: N/A");
    }

    #[test]
    fn le_registro_completo() {
        let est: Estabelecimento = serde_json::from_value(json!({
            "taxId": "31952078000130",
            "alias": "Cantina",
            "founded": "2018-11-06",
            "head": true,
            "status": { "id": 2, "text": "Ativa" },
            "company": {
                "name": "CANTINA LTDA",
                "equity": 50000.0,
                "nature": { "id": 2062, "text": "Sociedade Empresária Limitada" },
                "members": [{
                    "since": "2018-11-06",
                    "person": { "name": "FULANO DE TAL", "age": "41-50" },
                    "role": { "id": 49, "text": "Sócio-Administrador" }
                }]
            },
            "address": { "street": "Rua A", "number": "10", "district": "Centro",
                         "city": "Vitória", "state": "ES", "zip": "29000000" },
            "emails": [{ "address": "contato@cantina.com.br" }],
            "phones": [{ "area": "27", "number": "33330000" }],
            "mainActivity": { "id": 5611201, "text": "Restaurantes e similares" },
            "sideActivities": [{ "id": 5620104, "text": "Fornecimento de alimentos" }]
        }))
        .unwrap();

        assert_eq!(est.status.id, "2");
        assert_eq!(est.company.nature.id, "2062");
        assert_eq!(est.company.members[0].role.text, "Sócio-Administrador");
        assert_eq!(est.primeiro_email(), Some("contato@cantina.com.br"));
        assert_eq!(est.address.linha_logradouro(), "Rua A, 10 - Centro");
        assert_eq!(est.side_activities[0].id, "5620104");
    }
}
