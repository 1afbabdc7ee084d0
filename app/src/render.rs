//! Relatório da consulta no terminal.

use colored::*;
use std::io::{self, Write};

use crate::contexto::ContextoConsulta;
use crate::models::texto_ou_na;
use crate::utils;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpcoesExibicao {
    /// Lista sócios e atividades secundárias.
    pub detalhes: bool,
    /// Inclui o JSON completo do registro.
    pub json: bool,
}

pub fn relatorio<W: Write>(out: &mut W, ctx: &ContextoConsulta, opcoes: OpcoesExibicao) -> io::Result<()> {
    let est = &ctx.registro.estabelecimento;
    let c = &ctx.classificacao;

    // Grupos prioritários ganham destaque em vez de uma nota simples
    if c.prioritaria {
        writeln!(out, "{}", format!("🌟 GRUPO IDENTIFICADO: {}", c.grupo).yellow().bold())?;
        writeln!(
            out,
            "👉 {} Por ser do grupo de {}, confirme se a empresa exerce a atividade de: {}",
            "Atenção:".bold(),
            c.grupo,
            c.instrucao.bold()
        )?;
    } else {
        writeln!(out, "{}", format!("🔍 Grupo: {}", c.grupo).bold())?;
        writeln!(
            out,
            "{}",
            format!(
                "Nota: Por ser do grupo de {}, confirme se a empresa exerce a atividade de: {}",
                c.grupo, c.instrucao
            )
            .italic()
        )?;
    }

    writeln!(
        out,
        "{} {} - {}",
        "CNAE Principal:".green().bold(),
        est.main_activity.id,
        est.main_activity.text
    )?;
    linha(out)?;

    let situacao = if est.status.text.is_empty() { "N/A" } else { est.status.text.as_str() };
    let pesquisa = est
        .updated
        .as_deref()
        .map(utils::formatar_data)
        .unwrap_or_else(|| "N/A".to_string());
    let fundacao = est
        .founded
        .as_deref()
        .map(utils::formatar_data)
        .unwrap_or_else(|| "N/A".to_string());

    metrica(out, "Situação", situacao)?;
    metrica(out, "Data da Pesquisa", &pesquisa)?;
    metrica(out, "Fundação", &fundacao)?;
    if !est.company.nature.text.is_empty() {
        metrica(out, "Natureza Jurídica", &est.company.nature.text)?;
    }
    if let Some(porte) = est.company.size.as_ref().and_then(|p| p.text.as_deref()) {
        metrica(out, "Porte", porte)?;
    }
    metrica(out, "CNAE", &est.main_activity.id)?;

    writeln!(out)?;
    writeln!(out, "🏢 {}", est.company.name.bold())?;
    writeln!(out, "   CNPJ: {}", utils::formatar_cnpj(&ctx.cnpj))?;
    if let Some(alias) = est.alias.as_deref().filter(|a| !a.is_empty()) {
        writeln!(out, "   Nome fantasia: {}", alias)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "📍 Endereço".blue().bold())?;
    writeln!(out, "   {}", est.address.linha_logradouro())?;
    if let Some(complemento) = est.address.details.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "   {}", complemento)?;
    }
    writeln!(out, "   {}", est.address.linha_cidade())?;

    writeln!(out)?;
    writeln!(out, "{}", "📞 Contato".blue().bold())?;
    writeln!(out, "   {} {}", "Email:".bold(), est.primeiro_email().unwrap_or("N/A"))?;
    for tel in &est.phones {
        writeln!(out, "   {} ({}) {}", "Telefone:".bold(), tel.area, tel.number)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "📊 Indicadores".blue().bold())?;
    let ind = &ctx.indicadores;
    let idade = ind
        .idade_anos
        .map(|a| format!("{} ano(s)", a))
        .unwrap_or_else(|| "N/A".to_string());
    metrica(out, "Idade", &idade)?;
    metrica(out, "Tipo", if ind.matriz { "Matriz" } else { "Filial" })?;
    let capital = ind
        .capital_social
        .map(utils::formatar_moeda)
        .unwrap_or_else(|| "N/A".to_string());
    metrica(out, "Capital Social", &capital)?;
    metrica(out, "Sócios", &ind.quantidade_socios.to_string())?;
    metrica(
        out,
        "Atividades secundárias",
        &format!(
            "{} ({} no mesmo grupo)",
            ind.quantidade_atividades_secundarias, ind.secundarias_no_grupo
        ),
    )?;

    if opcoes.detalhes {
        writeln!(out)?;
        writeln!(out, "{}", "👥 Quadro societário".blue().bold())?;
        if est.company.members.is_empty() {
            writeln!(out, "   Nenhum sócio informado")?;
        }
        for socio in &est.company.members {
            writeln!(
                out,
                "   • {} - {} (desde {}, faixa etária {})",
                socio.person.name,
                socio.role.text,
                socio.since.as_deref().map(utils::formatar_data).unwrap_or_else(|| "N/A".to_string()),
                if socio.person.age.is_empty() { "N/A" } else { socio.person.age.as_str() }
            )?;
        }

        writeln!(out)?;
        writeln!(out, "{}", "🗂  Atividades secundárias".blue().bold())?;
        if est.side_activities.is_empty() {
            writeln!(out, "   Nenhuma atividade secundária")?;
        }
        for atividade in &est.side_activities {
            writeln!(out, "   • {} - {}", atividade.id, atividade.text)?;
        }
    }

    if opcoes.json {
        writeln!(out)?;
        writeln!(out, "{}", "JSON completo".blue().bold())?;
        let json = serde_json::to_string_pretty(&ctx.registro.bruto).map_err(io::Error::other)?;
        writeln!(out, "{}", json)?;
    }

    Ok(())
}

fn metrica<W: Write>(out: &mut W, rotulo: &str, valor: &str) -> io::Result<()> {
    writeln!(out, "   {:<24} {}", format!("{}:", rotulo).dimmed(), valor)
}

fn linha<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "─".repeat(60).dimmed())
}

/// Texto simples usado em mensagens: "Cidade/UF".
pub fn local(ctx: &ContextoConsulta) -> String {
    let end = &ctx.registro.estabelecimento.address;
    format!("{}/{}", texto_ou_na(&end.city), texto_ou_na(&end.state))
}
