//! Consulta de CNPJ na base pública, classificação setorial pela CNAE
//! principal e exportação do resultado.

pub mod api;
pub mod classificacao;
pub mod contexto;
pub mod exportacao;
pub mod indicadores;
pub mod models;
pub mod registro;
pub mod render;
pub mod ui;
pub mod utils;
