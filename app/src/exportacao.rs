//! Exportação do resultado da consulta em CSV, XLSX ou JSON.

use anyhow::{Context, Result};
use clap::ValueEnum;
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::contexto::ContextoConsulta;
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Formato {
    Csv,
    Xlsx,
    Json,
}

impl Formato {
    pub fn extensao(&self) -> &'static str {
        match self {
            Formato::Csv => "csv",
            Formato::Xlsx => "xlsx",
            Formato::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Formato::Csv => "text/csv",
            Formato::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Formato::Json => "application/json",
        }
    }
}

/// Quais colunas vão para o arquivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Registro inteiro achatado, mais as colunas de classificação.
    #[default]
    Completo,
    /// Apenas os campos principais.
    Resumo,
}

/// Uma linha tabular com seu cabeçalho.
#[derive(Debug, Clone, PartialEq)]
pub struct Tabela {
    pub cabecalho: Vec<String>,
    pub linha: Vec<String>,
}

impl Tabela {
    fn from_pares(pares: Vec<(String, String)>) -> Self {
        let (cabecalho, linha) = pares.into_iter().unzip();
        Self { cabecalho, linha }
    }

    pub fn valor(&self, coluna: &str) -> Option<&str> {
        self.cabecalho
            .iter()
            .position(|c| c == coluna)
            .map(|i| self.linha[i].as_str())
    }
}

pub fn nome_arquivo(cnpj: &str, formato: Formato) -> String {
    format!("cnpj_{}.{}", cnpj, formato.extensao())
}

pub fn tabela(ctx: &ContextoConsulta, layout: Layout) -> Tabela {
    match layout {
        Layout::Completo => tabela_completa(ctx),
        Layout::Resumo => tabela_resumo(ctx),
    }
}

fn tabela_completa(ctx: &ContextoConsulta) -> Tabela {
    let mut pares = vec![
        ("cnpj".to_string(), ctx.cnpj.clone()),
        ("classificacao.grupo".to_string(), ctx.classificacao.grupo.clone()),
        (
            "classificacao.prioritaria".to_string(),
            ctx.classificacao.prioritaria.to_string(),
        ),
    ];
    pares.extend(achatar(&ctx.registro.bruto));
    Tabela::from_pares(pares)
}

fn tabela_resumo(ctx: &ContextoConsulta) -> Tabela {
    let est = &ctx.registro.estabelecimento;
    let pares = [
        ("cnpj", ctx.cnpj.clone()),
        ("razao_social", est.company.name.clone()),
        ("grupo", ctx.classificacao.grupo.clone()),
        ("cnae_principal", est.main_activity.id.clone()),
        ("cnae_descricao", est.main_activity.text.clone()),
        ("situacao", est.status.text.clone()),
        (
            "capital_social",
            est.company.equity.map(|v| v.to_string()).unwrap_or_default(),
        ),
        ("natureza_juridica", est.company.nature.text.clone()),
        ("cidade", est.address.city.clone().unwrap_or_default()),
        ("uf", est.address.state.clone().unwrap_or_default()),
    ];
    Tabela::from_pares(pares.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// Achata um objeto JSON em pares coluna/valor com chaves pontuadas
/// ("address.city"). Listas viram o próprio JSON em texto.
pub fn achatar(valor: &Value) -> Vec<(String, String)> {
    let mut saida = Vec::new();
    achatar_em("", valor, &mut saida);
    saida
}

fn achatar_em(prefixo: &str, valor: &Value, saida: &mut Vec<(String, String)>) {
    match valor {
        Value::Object(mapa) if !mapa.is_empty() => {
            for (chave, filho) in mapa {
                let coluna = if prefixo.is_empty() {
                    chave.clone()
                } else {
                    format!("{}.{}", prefixo, chave)
                };
                achatar_em(&coluna, filho, saida);
            }
        }
        _ => {
            let coluna = if prefixo.is_empty() { "valor" } else { prefixo };
            saida.push((coluna.to_string(), texto_da_celula(valor)));
        }
    }
}

fn texto_da_celula(valor: &Value) -> String {
    match valor {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(m) if m.is_empty() => String::new(),
        outro => outro.to_string(),
    }
}

/// Gera o conteúdo do arquivo em memória.
pub fn gerar(ctx: &ContextoConsulta, formato: Formato, layout: Layout) -> Result<Vec<u8>> {
    match formato {
        Formato::Csv => gerar_csv(&tabela(ctx, layout)),
        Formato::Xlsx => gerar_xlsx(&tabela(ctx, layout)),
        Formato::Json => gerar_json(ctx, layout),
    }
}

pub fn gerar_csv(tabela: &Tabela) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&tabela.cabecalho)?;
    wtr.write_record(&tabela.linha)?;
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {}", e.error()))
}

pub fn gerar_xlsx(tabela: &Tabela) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let negrito = Format::new().set_bold();
    let planilha = workbook.add_worksheet();
    planilha.set_name("CNPJ")?;

    for (col, (titulo, valor)) in tabela.cabecalho.iter().zip(&tabela.linha).enumerate() {
        let col = u16::try_from(col).context("Colunas demais para a planilha")?;
        planilha.write_string_with_format(0, col, titulo, &negrito)?;
        planilha.write_string(1, col, valor)?;
    }

    workbook
        .save_to_buffer()
        .context("Falha ao gerar planilha XLSX")
}

fn gerar_json(ctx: &ContextoConsulta, layout: Layout) -> Result<Vec<u8>> {
    let bytes = match layout {
        Layout::Completo => serde_json::to_vec_pretty(ctx)?,
        Layout::Resumo => {
            let t = tabela_resumo(ctx);
            let objeto: serde_json::Map<String, Value> = t
                .cabecalho
                .into_iter()
                .zip(t.linha.into_iter().map(Value::String))
                .collect();
            serde_json::to_vec_pretty(&objeto)?
        }
    };
    Ok(bytes)
}

/// Grava o arquivo em `dir` e devolve o caminho criado.
pub fn salvar(ctx: &ContextoConsulta, formato: Formato, layout: Layout, dir: &Path) -> Result<PathBuf> {
    utils::ensure_dir(dir)?;
    let caminho = dir.join(nome_arquivo(&ctx.cnpj, formato));
    let conteudo = gerar(ctx, formato, layout)?;
    fs::write(&caminho, conteudo)
        .with_context(|| format!("Falha ao gravar arquivo: {}", caminho.display()))?;
    Ok(caminho)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registro::Registro;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn contexto() -> ContextoConsulta {
        let bruto = json!({
            "taxId": "31952078000130",
            "company": {
                "name": "CANTINA LTDA",
                "equity": 50000,
                "nature": { "id": 2062, "text": "Sociedade Empresária Limitada" },
                "members": []
            },
            "status": { "id": 2, "text": "Ativa" },
            "address": { "city": "Vitória", "state": "ES" },
            "phones": [{ "area": "27", "number": "33330000" }],
            "mainActivity": { "id": 5611201, "text": "Restaurantes e similares" }
        });
        ContextoConsulta::montar(
            "31952078000130".into(),
            Registro::from_json(bruto).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
    }

    #[test]
    fn achata_objetos_aninhados() {
        let pares = achatar(&json!({
            "a": 1,
            "b": { "c": "x", "d": null, "e": {} },
            "f": [1, 2]
        }));
        assert_eq!(
            pares,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b.c".to_string(), "x".to_string()),
                ("b.d".to_string(), String::new()),
                ("b.e".to_string(), String::new()),
                ("f".to_string(), "[1,2]".to_string()),
            ]
        );
    }

    #[test]
    fn resumo_tem_campos_principais() {
        let t = tabela(&contexto(), Layout::Resumo);
        assert_eq!(t.valor("cnpj"), Some("31952078000130"));
        assert_eq!(t.valor("razao_social"), Some("CANTINA LTDA"));
        assert_eq!(t.valor("grupo"), Some("Alimentação"));
        assert_eq!(t.valor("cnae_principal"), Some("5611201"));
        assert_eq!(t.valor("capital_social"), Some("50000"));
        assert_eq!(t.valor("uf"), Some("ES"));
        assert_eq!(t.cabecalho.len(), t.linha.len());
    }

    #[test]
    fn completo_segue_a_ordem_do_registro() {
        let t = tabela(&contexto(), Layout::Completo);
        assert_eq!(&t.cabecalho[..4], ["cnpj", "classificacao.grupo", "classificacao.prioritaria", "taxId"]);
        assert_eq!(t.valor("company.name"), Some("CANTINA LTDA"));
        assert_eq!(t.valor("mainActivity.id"), Some("5611201"));
        assert_eq!(t.valor("phones"), Some(r#"[{"area":"27","number":"33330000"}]"#));
    }

    #[test]
    fn csv_tem_cabecalho_e_uma_linha() {
        let bytes = gerar(&contexto(), Formato::Csv, Layout::Resumo).unwrap();
        let texto = String::from_utf8(bytes).unwrap();
        let linhas: Vec<&str> = texto.lines().collect();
        assert_eq!(linhas.len(), 2);
        assert!(linhas[0].starts_with("cnpj,razao_social,grupo,"));
        assert!(linhas[1].starts_with("31952078000130,CANTINA LTDA,Alimentação,"));
    }

    #[test]
    fn json_resumo_e_objeto_plano() {
        let bytes = gerar(&contexto(), Formato::Json, Layout::Resumo).unwrap();
        let valor: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(valor["grupo"], "Alimentação");
        assert_eq!(valor["cidade"], "Vitória");
    }

    #[test]
    fn json_completo_inclui_classificacao_e_registro() {
        let bytes = gerar(&contexto(), Formato::Json, Layout::Completo).unwrap();
        let valor: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(valor["classificacao"]["grupo"], "Alimentação");
        assert_eq!(valor["classificacao"]["prioritaria"], false);
        assert_eq!(valor["registro"]["company"]["name"], "CANTINA LTDA");
        assert_eq!(valor["data_consulta"], "2025-01-01");
    }

    #[test]
    fn nome_do_arquivo_usa_cnpj() {
        assert_eq!(nome_arquivo("31952078000130", Formato::Xlsx), "cnpj_31952078000130.xlsx");
    }
}
