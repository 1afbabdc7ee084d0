use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::classificacao::{self, Classificacao};
use crate::models::Estabelecimento;
use crate::utils;

/// Indicadores estratégicos derivados do registro consultado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicadores {
    /// Anos completos desde a fundação até a data da consulta.
    pub idade_anos: Option<u32>,
    pub matriz: bool,
    pub quantidade_socios: usize,
    pub quantidade_atividades_secundarias: usize,
    /// Atividades secundárias classificadas no mesmo grupo da principal.
    pub secundarias_no_grupo: usize,
    pub capital_social: Option<f64>,
}

pub fn calcular(
    est: &Estabelecimento,
    classificacao: &Classificacao,
    data_consulta: NaiveDate,
) -> Indicadores {
    let idade_anos = est
        .founded
        .as_deref()
        .and_then(utils::data_iso)
        .and_then(|fundacao| anos_completos(fundacao, data_consulta));

    let secundarias_no_grupo = est
        .side_activities
        .iter()
        .filter(|a| classificacao::classificar(&a.id).grupo == classificacao.grupo)
        .count();

    Indicadores {
        idade_anos,
        matriz: est.head,
        quantidade_socios: est.company.members.len(),
        quantidade_atividades_secundarias: est.side_activities.len(),
        secundarias_no_grupo,
        capital_social: est.company.equity,
    }
}

fn anos_completos(inicio: NaiveDate, fim: NaiveDate) -> Option<u32> {
    if fim < inicio {
        return None;
    }
    let mut anos = fim.year() - inicio.year();
    if (fim.month(), fim.day()) < (inicio.month(), inicio.day()) {
        anos -= 1;
    }
    u32::try_from(anos).ok()
}
