//! FetchXML クエリ構築
//!
//! 値の埋め込みは必ず `escape` を通す。生の文字列連結でクエリを組むと
//! FetchXML インジェクションが成立するため、この層の外でXMLを組まない。

/// FetchXML属性値として安全な形へエスケープ
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

/// ソリューション所属確認クエリ
///
/// solutioncomponent をアセンブリ（name等値）とソリューション
/// （uniquename等値）の両方へ結合し、所属していれば1行以上返る。
pub fn solution_component_query(assembly_name: &str, solution_unique_name: &str) -> String {
    format!(
        "<fetch>\
           <entity name='solutioncomponent'>\
             <attribute name='solutioncomponentid'/>\
             <link-entity name='pluginassembly' from='pluginassemblyid' to='objectid'>\
               <attribute name='pluginassemblyid'/>\
               <filter type='and'>\
                 <condition attribute='name' operator='eq' value='{}'/>\
               </filter>\
             </link-entity>\
             <link-entity name='solution' from='solutionid' to='solutionid'>\
               <attribute name='solutionid'/>\
               <filter type='and'>\
                 <condition attribute='uniquename' operator='eq' value='{}'/>\
               </filter>\
             </link-entity>\
           </entity>\
         </fetch>",
        escape(assembly_name),
        escape(solution_unique_name)
    )
}


#[cfg(test)]
#[path = "fetchxml_proptests.rs"]
mod proptests;
