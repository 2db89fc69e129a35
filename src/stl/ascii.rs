use nom::{
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{multispace0, multispace1},
    combinator::{eof, map, map_res, peek},
    number::complete::recognize_float,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::{Mesh, MeshError};

struct Facet {
    normal: [f32; 3],
    vertices: [[f32; 3]; 3],
}

/// Next whitespace-delimited word. Fails only when nothing but whitespace
/// remains.
fn word(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, take_till1(|c: char| c.is_ascii_whitespace()))(input)
}

/// A float literal that fills a whole word.
fn literal(input: &str) -> IResult<&str, f32> {
    preceded(
        multispace1,
        terminated(
            map_res(recognize_float, |s: &str| s.parse::<f32>()),
            peek(alt((multispace1, eof))),
        ),
    )(input)
}

fn vector3(input: &str) -> IResult<&str, [f32; 3]> {
    map(tuple((literal, literal, literal)), |(x, y, z)| [x, y, z])(input)
}

fn keyword_vector<'a>(
    text: &str,
    input: &'a str,
    keyword: &str,
) -> Result<(&'a str, [f32; 3]), MeshError> {
    vector3(input).map_err(|_| {
        MeshError::MalformedStl(format!(
            "'{keyword}' at byte {} is not followed by three numbers",
            text.len() - input.len()
        ))
    })
}

/// Parse the body of a facet, just past its `facet` keyword, up to and
/// including `endfacet`.
fn parse_facet<'a>(text: &str, mut input: &'a str) -> Result<(&'a str, Facet), MeshError> {
    let start = text.len() - input.len();
    let mut normal = [0.0; 3];
    let mut vertices = Vec::with_capacity(3);

    loop {
        let Ok((rest, token)) = word(input) else {
            return Err(MeshError::TruncatedInput(format!(
                "facet opened at byte {start} has no endfacet"
            )));
        };
        input = rest;

        match token {
            "normal" => (input, normal) = keyword_vector(text, input, "normal")?,
            "vertex" => {
                let (rest, vertex) = keyword_vector(text, input, "vertex")?;
                input = rest;
                vertices.push(vertex);
            }
            "endfacet" => break,
            "facet" => {
                return Err(MeshError::MalformedStl(format!(
                    "facet opened at byte {start} contains another facet"
                )))
            }
            _ => {}
        }
    }

    let found = vertices.len();
    let vertices = vertices.try_into().map_err(|_| {
        MeshError::MalformedStl(format!(
            "facet at byte {start} has {found} vertices, expected 3"
        ))
    })?;
    Ok((input, Facet { normal, vertices }))
}

pub(crate) fn decode_ascii(text: &str) -> Result<Mesh, MeshError> {
    let mut positions = Vec::new();
    let mut faces = Vec::new();
    let mut face_normals = Vec::new();

    let mut input = text;
    while let Ok((rest, token)) = word(input) {
        input = rest;
        if token != "facet" {
            continue;
        }

        let (rest, facet) = parse_facet(text, input)?;
        input = rest;

        #[allow(clippy::cast_possible_truncation)]
        let base = positions.len() as u32;
        positions.extend_from_slice(&facet.vertices);
        faces.push([base, base + 1, base + 2]);
        face_normals.push(facet.normal);
    }

    Ok(Mesh {
        positions,
        faces,
        face_normals: Some(face_normals),
        ..Default::default()
    })
}
