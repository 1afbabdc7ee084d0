use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

pub const CNPJ_DIGITOS: usize = 14;

/// Mantém apenas os dígitos 0-9 da entrada, na ordem original.
///
/// Aceita o CNPJ com ou sem pontuação ("31.952.078/0001-30" ou
/// "31952078000130"). Não valida tamanho nem dígitos verificadores.
pub fn somente_digitos(entrada: &str) -> String {
    entrada.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Confere tamanho e dígitos verificadores (módulo 11) de um CNPJ já normalizado.
pub fn cnpj_valido(cnpj: &str) -> bool {
    if cnpj.len() != CNPJ_DIGITOS || !cnpj.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digitos: Vec<u32> = cnpj.bytes().map(|b| (b - b'0') as u32).collect();

    // Sequências repetidas passam no cálculo mas não são CNPJs emitidos
    if digitos.iter().all(|&d| d == digitos[0]) {
        return false;
    }

    let dv1 = digito_verificador(&digitos[..12]);
    let dv2 = digito_verificador(&digitos[..13]);
    digitos[12] == dv1 && digitos[13] == dv2
}

fn digito_verificador(base: &[u32]) -> u32 {
    // Pesos 2..9 aplicados da direita para a esquerda, reiniciando após o 9
    let soma: u32 = base
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| d * (2 + (i as u32 % 8)))
        .sum();
    let resto = soma % 11;
    if resto < 2 {
        0
    } else {
        11 - resto
    }
}

/// Formata 14 dígitos como 00.000.000/0000-00; outras entradas voltam sem alteração.
pub fn formatar_cnpj(cnpj: &str) -> String {
    if cnpj.len() != CNPJ_DIGITOS || !cnpj.bytes().all(|b| b.is_ascii_digit()) {
        return cnpj.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &cnpj[0..2],
        &cnpj[2..5],
        &cnpj[5..8],
        &cnpj[8..12],
        &cnpj[12..14]
    )
}

/// Converte "2018-11-06" (ou "2024-01-01T12:00:00Z") para "06/11/2018".
/// Datas que não seguem o formato ISO são devolvidas como vieram.
pub fn formatar_data(iso: &str) -> String {
    match data_iso(iso) {
        Some(data) => data.format("%d/%m/%Y").to_string(),
        None => iso.to_string(),
    }
}

pub fn data_iso(iso: &str) -> Option<NaiveDate> {
    let prefixo = iso.get(..10)?;
    NaiveDate::parse_from_str(prefixo, "%Y-%m-%d").ok()
}

/// Valor monetário no padrão brasileiro: 1234567.5 -> "R$ 1.234.567,50".
pub fn formatar_moeda(valor: f64) -> String {
    let centavos = (valor.abs() * 100.0).round() as u64;
    let inteiro = (centavos / 100).to_string();
    let fracao = centavos % 100;

    let mut agrupado = String::new();
    for (i, c) in inteiro.chars().enumerate() {
        if i > 0 && (inteiro.len() - i) % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(c);
    }

    let sinal = if valor < 0.0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sinal, agrupado, fracao)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Falha ao criar diretório: {}", path.display()))?;
    }
    Ok(())
}
