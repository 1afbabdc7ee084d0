use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::classificacao::{self, Classificacao};
use crate::indicadores::{self, Indicadores};
use crate::registro::{ClienteRegistro, ErroConsulta, Registro};
use crate::utils;

/// Tudo o que uma consulta produz, passado adiante para exibição e exportação.
#[derive(Debug, Clone, Serialize)]
pub struct ContextoConsulta {
    pub cnpj: String,
    pub data_consulta: NaiveDate,
    pub classificacao: Classificacao,
    pub indicadores: Indicadores,
    #[serde(serialize_with = "serializar_bruto")]
    pub registro: Registro,
}

fn serializar_bruto<S>(registro: &Registro, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serde::Serialize::serialize(&registro.bruto, serializer)
}

impl ContextoConsulta {
    pub fn montar(cnpj: String, registro: Registro, data_consulta: NaiveDate) -> Self {
        let classificacao = classificacao::classificar(&registro.estabelecimento.main_activity.id);
        let indicadores =
            indicadores::calcular(&registro.estabelecimento, &classificacao, data_consulta);
        Self {
            cnpj,
            data_consulta,
            classificacao,
            indicadores,
            registro,
        }
    }

    /// Normaliza a entrada, consulta a base e classifica.
    pub async fn consultar(cliente: &ClienteRegistro, entrada: &str) -> Result<Self, ErroConsulta> {
        let cnpj = utils::somente_digitos(entrada);
        let registro = cliente.consultar(&cnpj).await?;
        Ok(Self::montar(cnpj, registro, Local::now().date_naive()))
    }
}
