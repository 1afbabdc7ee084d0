//! Classificação setorial a partir da CNAE principal.
//!
//! A tabela de regras é avaliada em ordem e a primeira regra que casa define o
//! grupo. As regras de prioridade (hospitalidade) vêm antes de qualquer regra
//! por prefixo; quando nada casa, o resultado é o grupo padrão.

use serde::Serialize;
use std::fmt;

pub const GRUPO_PADRAO: &str = "Outros tipos";
pub const INSTRUCAO_PADRAO: &str = "Verifique a atividade principal no cadastro.";
pub const GRUPO_HOSPITALIDADE: &str = "HOSPITALIDADE";

/// Predicado de uma regra sobre o código CNAE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterio {
    /// O código completo começa com o valor (usado pelas regras de prioridade).
    ComecaCom(&'static str),
    /// Prefixo de dois dígitos igual ao valor.
    Prefixo(&'static str),
    /// Prefixo de dois dígitos pertence ao conjunto.
    PrefixoEm(&'static [&'static str]),
    /// Prefixo de dois dígitos dentro da faixa fechada.
    Faixa(&'static str, &'static str),
}

impl Criterio {
    pub fn casa(&self, cnae: &str) -> bool {
        match *self {
            Criterio::ComecaCom(inicio) => cnae.starts_with(inicio),
            Criterio::Prefixo(p) => prefixo(cnae) == Some(p),
            Criterio::PrefixoEm(conjunto) => {
                prefixo(cnae).is_some_and(|p| conjunto.contains(&p))
            }
            Criterio::Faixa(inicio, fim) => {
                match (divisao(cnae), limite(inicio), limite(fim)) {
                    (Some(valor), Some(inicio), Some(fim)) => (inicio..=fim).contains(&valor),
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Display for Criterio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterio::ComecaCom(inicio) => write!(f, "começa com {}", inicio),
            Criterio::Prefixo(p) => write!(f, "prefixo {}", p),
            Criterio::PrefixoEm(conjunto) => write!(f, "prefixo em {{{}}}", conjunto.join(", ")),
            Criterio::Faixa(inicio, fim) => write!(f, "prefixo entre {} e {}", inicio, fim),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Regra {
    pub criterio: Criterio,
    pub grupo: &'static str,
    pub instrucao: &'static str,
    pub prioritaria: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classificacao {
    pub grupo: String,
    pub instrucao: String,
    pub prioritaria: bool,
}

impl Classificacao {
    fn de_regra(regra: &Regra) -> Self {
        Self {
            grupo: regra.grupo.to_string(),
            instrucao: regra.instrucao.to_string(),
            prioritaria: regra.prioritaria,
        }
    }

    fn padrao() -> Self {
        Self {
            grupo: GRUPO_PADRAO.to_string(),
            instrucao: INSTRUCAO_PADRAO.to_string(),
            prioritaria: false,
        }
    }
}

const INSTRUCAO_HOSPITALIDADE: &str =
    "Hoteis, Resorts, Flats ou Hospitais com serviços de hotelaria/leitos.";

static REGRAS: &[Regra] = &[
    // Alojamento (divisão 55)
    Regra {
        criterio: Criterio::ComecaCom("55"),
        grupo: GRUPO_HOSPITALIDADE,
        instrucao: INSTRUCAO_HOSPITALIDADE,
        prioritaria: true,
    },
    // Hospitais com leitos (classe 8610)
    Regra {
        criterio: Criterio::ComecaCom("8610"),
        grupo: GRUPO_HOSPITALIDADE,
        instrucao: INSTRUCAO_HOSPITALIDADE,
        prioritaria: true,
    },
    Regra {
        criterio: Criterio::Prefixo("56"),
        grupo: "Alimentação",
        instrucao: "Restaurantes, bares, lanchonetes e bufê.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::PrefixoEm(&["62", "63"]),
        grupo: "Tecnologia e Informação",
        instrucao: "Software, consultoria em TI e portais de dados.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::PrefixoEm(&["86", "87", "88"]),
        grupo: "Saúde Humana",
        instrucao: "Clínicas, assistência social e serviços psicossociais.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::Prefixo("85"),
        grupo: "Educação",
        instrucao: "Ensino fundamental, médio, superior e cursos.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::Prefixo("47"),
        grupo: "Comércio Varejista",
        instrucao: "Supermercados, lojas de vestuário e farmácias.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::Prefixo("68"),
        grupo: "Atividades Imobiliárias",
        instrucao: "Compra, venda, aluguel e administração de imóveis.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::Faixa("69", "75"),
        grupo: "Serviços Profissionais",
        instrucao: "Advocacia, Contabilidade, Engenharia ou Veterinária.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::Faixa("49", "53"),
        grupo: "Transporte e Logística",
        instrucao: "Transporte de cargas/passageiros, armazenagem e correios.",
        prioritaria: false,
    },
    Regra {
        criterio: Criterio::Faixa("10", "33"),
        grupo: "Indústria de Transformação",
        instrucao: "Fabricação de alimentos, têxteis, máquinas e móveis.",
        prioritaria: false,
    },
];

/// Tabela de regras na ordem de avaliação.
pub fn regras() -> &'static [Regra] {
    REGRAS
}

/// Classifica um código CNAE. Sempre produz um resultado; códigos vazios ou
/// sem regra correspondente caem no grupo padrão.
pub fn classificar(cnae: &str) -> Classificacao {
    REGRAS
        .iter()
        .find(|regra| regra.criterio.casa(cnae))
        .map(Classificacao::de_regra)
        .unwrap_or_else(Classificacao::padrao)
}

/// Confere se toda faixa da tabela usa limites de exatamente dois dígitos.
/// Devolve a descrição de cada regra fora do padrão.
pub fn validar_tabela(regras: &[Regra]) -> Vec<String> {
    regras
        .iter()
        .filter_map(|regra| match regra.criterio {
            Criterio::Faixa(inicio, fim) if limite(inicio).is_none() || limite(fim).is_none() => {
                Some(format!(
                    "{}: limites da faixa devem ter dois dígitos ({} .. {})",
                    regra.grupo, inicio, fim
                ))
            }
            _ => None,
        })
        .collect()
}

/// Os dois primeiros caracteres do código (divisão CNAE), se houver.
fn prefixo(cnae: &str) -> Option<&str> {
    cnae.get(..2)
}

/// Divisão CNAE como número, apenas quando o prefixo são dois dígitos.
fn divisao(cnae: &str) -> Option<u8> {
    prefixo(cnae).and_then(limite)
}

fn limite(valor: &str) -> Option<u8> {
    if valor.len() == 2 && valor.bytes().all(|b| b.is_ascii_digit()) {
        valor.parse().ok()
    } else {
        None
    }
}
