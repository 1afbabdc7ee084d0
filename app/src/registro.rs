use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Estabelecimento;

pub const URL_API_PADRAO: &str = "https://open.cnpja.com/office";
pub const TIMEOUT_PADRAO_SEGS: u64 = 30;

#[derive(Debug, Error)]
pub enum ErroConsulta {
    #[error("Digite o CNPJ para consultar")]
    EntradaVazia,

    #[error("Erro na consulta: CNPJ {cnpj} não encontrado.")]
    NaoEncontrado { cnpj: String },

    #[error("Erro na consulta do CNPJ {cnpj}: a base respondeu HTTP {status}")]
    ErroUpstream { cnpj: String, status: u16 },

    #[error("Tempo esgotado após {segundos}s consultando o CNPJ {cnpj}")]
    TempoEsgotado { cnpj: String, segundos: u64 },

    #[error("Falha de comunicação com a base de dados: {0}")]
    Transporte(#[source] reqwest::Error),

    #[error("Resposta inválida da base de dados: {0}")]
    RespostaInvalida(#[source] serde_json::Error),
}

/// Registro bruto e sua leitura tipada.
#[derive(Debug, Clone)]
pub struct Registro {
    pub bruto: serde_json::Value,
    pub estabelecimento: Estabelecimento,
}

impl Registro {
    pub fn from_json(bruto: serde_json::Value) -> Result<Self, serde_json::Error> {
        let estabelecimento = serde_json::from_value(bruto.clone())?;
        Ok(Self { bruto, estabelecimento })
    }
}

#[derive(Debug, Clone)]
pub struct ConfigRegistro {
    pub url_base: String,
    pub timeout: Duration,
}

impl Default for ConfigRegistro {
    fn default() -> Self {
        Self {
            url_base: URL_API_PADRAO.to_string(),
            timeout: Duration::from_secs(TIMEOUT_PADRAO_SEGS),
        }
    }
}

/// Cliente da API de CNPJ: uma única tentativa por consulta, com timeout.
#[derive(Debug, Clone)]
pub struct ClienteRegistro {
    http: reqwest::Client,
    config: ConfigRegistro,
}

impl ClienteRegistro {
    pub fn new(config: ConfigRegistro) -> Result<Self, ErroConsulta> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cnpj-consulta/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(ErroConsulta::Transporte)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ConfigRegistro {
        &self.config
    }

    pub fn url_para(&self, cnpj: &str) -> String {
        format!("{}/{}", self.config.url_base.trim_end_matches('/'), cnpj)
    }

    /// Busca o registro de um CNPJ já normalizado.
    pub async fn consultar(&self, cnpj: &str) -> Result<Registro, ErroConsulta> {
        if cnpj.is_empty() {
            return Err(ErroConsulta::EntradaVazia);
        }

        let url = self.url_para(cnpj);
        debug!(%url, "consultando registro");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.erro_de_transporte(cnpj, e))?;

        let status = response.status();
        debug!(cnpj, status = status.as_u16(), "resposta recebida");

        match status {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(ErroConsulta::NaoEncontrado { cnpj: cnpj.to_string() });
            }
            outro => {
                warn!(cnpj, status = outro.as_u16(), "base respondeu com erro");
                return Err(ErroConsulta::ErroUpstream {
                    cnpj: cnpj.to_string(),
                    status: outro.as_u16(),
                });
            }
        }

        let corpo = response
            .bytes()
            .await
            .map_err(|e| self.erro_de_transporte(cnpj, e))?;
        let bruto: serde_json::Value =
            serde_json::from_slice(&corpo).map_err(ErroConsulta::RespostaInvalida)?;

        Registro::from_json(bruto).map_err(ErroConsulta::RespostaInvalida)
    }

    fn erro_de_transporte(&self, cnpj: &str, e: reqwest::Error) -> ErroConsulta {
        if e.is_timeout() {
            ErroConsulta::TempoEsgotado {
                cnpj: cnpj.to_string(),
                segundos: self.config.timeout.as_secs(),
            }
        } else {
            ErroConsulta::Transporte(e)
        }
    }
}
